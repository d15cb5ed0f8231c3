use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Serializes `value` compactly, or tab-indented when `pretty` is set, and
/// terminates the document with a newline.
pub fn render_json<T: Serialize>(value: &T, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = if pretty {
        let mut buf = Vec::with_capacity(256);
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
        value.serialize(&mut ser)?;
        buf
    } else {
        serde_json::to_vec(value)?
    };
    out.push(b'\n');
    Ok(out)
}
