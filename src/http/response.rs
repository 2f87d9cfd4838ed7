/// Statuses the proxy answers with on its own.
///
/// Everything else the client sees is relayed verbatim from the upstream.
/// - `BadRequest` (400): the request could not be parsed, routed or rewritten
/// - `InternalProxyError` (500): the upstream response could not be relayed
/// - `BadGateway` (502): the upstream could not be resolved, reached or written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 400 Bad Request
    BadRequest,
    /// 500 Internal Proxy Error
    InternalProxyError,
    /// 502 Bad Gateway
    BadGateway,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use courier::http::response::StatusCode;
    /// assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    /// assert_eq!(StatusCode::BadGateway.as_u16(), 502);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::BadRequest => 400,
            StatusCode::InternalProxyError => 500,
            StatusCode::BadGateway => 502,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::BadRequest => "Bad Request",
            StatusCode::InternalProxyError => "Internal Proxy Error",
            StatusCode::BadGateway => "Bad Gateway",
        }
    }
}

/// A response generated by the proxy itself. These never carry a body.
///
/// Headers keep insertion order so the serialized form is stable.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::BadGateway)
///     .header("Connection", "close")
///     .build();
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Adds or replaces a header, keeping its original position on replace.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(existing) => existing.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Builds the final Response.
    ///
    /// Appends `Content-Length: 0` unless already set.
    pub fn build(self) -> Response {
        let has_length = self
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("Content-Length"));

        let mut headers = self.headers;
        if !has_length {
            headers.push(("Content-Length".to_string(), "0".to_string()));
        }

        Response {
            status: self.status,
            headers,
        }
    }
}

impl Response {
    /// Empty-bodied error response that closes the connection.
    pub fn error(status: StatusCode) -> Self {
        ResponseBuilder::new(status)
            .header("Connection", "close")
            .build()
    }
}
