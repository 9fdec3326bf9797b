//! Minimal XML-RPC codec for the TestLink API

use indexmap::IndexMap;
use quick_xml::events::{
    BytesDecl,
    BytesEnd,
    BytesStart,
    BytesText,
    Event,
};
use quick_xml::{
    Reader,
    Writer,
};

use crate::error::{
    TestLinkError,
    TestLinkResult,
};

/// An XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Struct(IndexMap<String, Value>),
    Nil,
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(key),
            _ => None,
        }
    }

    /// Integer view of the value. TestLink sends most ids as strings, so
    /// numeric strings are accepted too.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::String(s) => match s.trim() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Integer member lookup, see [`Value::as_i64`]
    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// String member lookup. Integers are rendered as text.
    pub fn string_field(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

struct MethodCallWriter {
    writer: Writer<Vec<u8>>,
}

impl MethodCallWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> TestLinkResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| TestLinkError::Serialization(e.to_string()))
    }

    fn start(&mut self, tag: &str) -> TestLinkResult<()> {
        self.event(Event::Start(BytesStart::new(tag)))
    }

    fn end(&mut self, tag: &str) -> TestLinkResult<()> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    fn element(&mut self, tag: &str, text: &str) -> TestLinkResult<()> {
        self.start(tag)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(tag)
    }

    fn value(&mut self, value: &Value) -> TestLinkResult<()> {
        self.start("value")?;
        match value {
            Value::Int(i) => self.element("int", &i.to_string())?,
            Value::Bool(b) => self.element("boolean", if *b { "1" } else { "0" })?,
            Value::Double(d) => self.element("double", &d.to_string())?,
            Value::String(s) => self.element("string", s)?,
            Value::Nil => self.event(Event::Empty(BytesStart::new("nil")))?,
            Value::Array(items) => {
                self.start("array")?;
                self.start("data")?;
                for item in items {
                    self.value(item)?;
                }
                self.end("data")?;
                self.end("array")?;
            }
            Value::Struct(members) => {
                self.start("struct")?;
                for (name, member) in members {
                    self.start("member")?;
                    self.element("name", name)?;
                    self.value(member)?;
                    self.end("member")?;
                }
                self.end("struct")?;
            }
        }
        self.end("value")
    }

    fn finish(self) -> TestLinkResult<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| TestLinkError::Serialization(e.to_string()))
    }
}

/// Encodes a `methodCall` document
pub fn encode_method_call(method: &str, params: &[Value]) -> TestLinkResult<String> {
    let mut writer = MethodCallWriter::new();
    writer.event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.start("methodCall")?;
    writer.element("methodName", method)?;
    writer.start("params")?;
    for param in params {
        writer.start("param")?;
        writer.value(param)?;
        writer.end("param")?;
    }
    writer.end("params")?;
    writer.end("methodCall")?;
    writer.finish()
}

#[derive(Debug)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn required_child(&self, name: &str) -> TestLinkResult<&Node> {
        self.child(name).ok_or_else(|| {
            TestLinkError::InvalidResponse(format!("<{}> without <{}>", self.name, name))
        })
    }
}

fn parse_tree(xml: &str) -> TestLinkResult<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Node::new(String::from("#document"))];

    loop {
        let event = reader
            .read_event()
            .map_err(|e| TestLinkError::InvalidResponse(e.to_string()))?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(Node::new(name));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::new(name));
                }
            }
            Event::End(_) => {
                let node = stack.pop();
                match (node, stack.last_mut()) {
                    (Some(node), Some(parent)) => parent.children.push(node),
                    _ => {
                        return Err(TestLinkError::InvalidResponse(
                            "Unbalanced XML document".to_string(),
                        ))
                    }
                }
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| TestLinkError::InvalidResponse(e.to_string()))?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                let bytes = c.into_inner();
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(document), true) => Ok(document),
        _ => Err(TestLinkError::InvalidResponse(
            "Unexpected end of XML document".to_string(),
        )),
    }
}

fn decode_value(node: &Node) -> TestLinkResult<Value> {
    match node.children.first() {
        None => Ok(Value::String(node.text.clone())),
        Some(typed) => decode_typed(typed),
    }
}

fn decode_typed(node: &Node) -> TestLinkResult<Value> {
    match node.name.as_str() {
        "i4" | "int" | "i8" => node
            .text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|e| TestLinkError::InvalidResponse(format!("Invalid integer: {e}"))),
        "boolean" => Ok(Value::Bool(matches!(node.text.trim(), "1" | "true"))),
        "double" => node
            .text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|e| TestLinkError::InvalidResponse(format!("Invalid double: {e}"))),
        "string" | "base64" | "dateTime.iso8601" => Ok(Value::String(node.text.clone())),
        "nil" => Ok(Value::Nil),
        "array" => {
            let items = match node.child("data") {
                Some(data) => data
                    .children
                    .iter()
                    .filter(|c| c.name == "value")
                    .map(decode_value)
                    .collect::<TestLinkResult<Vec<_>>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(items))
        }
        "struct" => {
            let mut members = IndexMap::new();
            for member in node.children.iter().filter(|c| c.name == "member") {
                let name = member.required_child("name")?.text.clone();
                let value = decode_value(member.required_child("value")?)?;
                members.insert(name, value);
            }
            Ok(Value::Struct(members))
        }
        other => Err(TestLinkError::InvalidResponse(format!(
            "Unsupported XML-RPC type <{other}>"
        ))),
    }
}

/// Parses a `methodResponse` document into its single return value.
/// Faults are turned into [`TestLinkError::Fault`].
pub fn parse_method_response(xml: &str) -> TestLinkResult<Value> {
    let document = parse_tree(xml)?;
    let response = document.required_child("methodResponse")?;

    if let Some(fault) = response.child("fault") {
        let value = decode_value(fault.required_child("value")?)?;
        return Err(TestLinkError::Fault {
            code: value.i64_field("faultCode").unwrap_or_default(),
            message: value.string_field("faultString").unwrap_or_default(),
        });
    }

    let value = response
        .required_child("params")?
        .required_child("param")?
        .required_child("value")?;
    decode_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_method_call() {
        let mut params = IndexMap::new();
        params.insert("devKey".to_string(), Value::from("abc"));
        params.insert("testplanid".to_string(), Value::from(7));
        params.insert("notes".to_string(), Value::from("a < b & c"));

        let xml = encode_method_call("tl.createBuild", &[Value::Struct(params)]).unwrap();

        assert_eq!(
            xml,
            "<?xml version=\"1.0\"?><methodCall><methodName>tl.createBuild</methodName>\
             <params><param><value><struct>\
             <member><name>devKey</name><value><string>abc</string></value></member>\
             <member><name>testplanid</name><value><int>7</int></value></member>\
             <member><name>notes</name><value><string>a &lt; b &amp; c</string></value></member>\
             </struct></value></param></params></methodCall>"
        );
    }

    #[test]
    fn test_parse_struct_response() {
        let xml = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <struct>
          <member><name>id</name><value><string>42</string></value></member>
          <member><name>name</name><value>Checkout &amp; pay</value></member>
          <member><name>active</name><value><boolean>1</boolean></value></member>
        </struct>
      </value>
    </param>
  </params>
</methodResponse>"#;

        let value = parse_method_response(xml).unwrap();
        assert_eq!(value.i64_field("id"), Some(42));
        assert_eq!(value.string_field("name").as_deref(), Some("Checkout & pay"));
        assert_eq!(value.get("active"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_parse_array_response() {
        let xml = "<methodResponse><params><param><value><array><data>\
                   <value><int>1</int></value><value><i4>2</i4></value><value><nil/></value>\
                   </data></array></value></param></params></methodResponse>";

        let value = parse_method_response(xml).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Nil])
        );
    }

    #[test]
    fn test_parse_fault() {
        let xml = "<methodResponse><fault><value><struct>\
                   <member><name>faultCode</name><value><int>-32601</int></value></member>\
                   <member><name>faultString</name><value><string>server error. requested method does not exist.</string></value></member>\
                   </struct></value></fault></methodResponse>";

        match parse_method_response(xml) {
            Err(TestLinkError::Fault { code, message }) => {
                assert_eq!(code, -32601);
                assert!(message.contains("does not exist"));
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_malformed_response() {
        assert!(parse_method_response("<methodResponse><params>").is_err());
        assert!(parse_method_response("<html>502</html>").is_err());
    }
}
