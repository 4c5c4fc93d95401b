/// Builds a plain `ws://` URL from a `host:port` authority and a path.
///
/// A path without a leading `/` gets one, so `("localhost:8080", "echo")`
/// and `("localhost:8080", "/echo")` name the same endpoint.
pub fn websocket_url(addr: &str, path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        format!("ws://{}{}", addr, path)
    } else {
        format!("ws://{}/{}", addr, path)
    }
}
