//! Shared Key request signing for the Azure Storage queue service.
//!
//! ```text
//! Authorization: SharedKey {account}:{base64(HMAC-SHA256(string_to_sign, account_key))}
//! ```

/// The parts of an outgoing request that take part in the signature.
pub(super) struct SignableRequest<'a> {
    pub method: &'a str,
    pub content_length: usize,
    pub content_type: Option<&'a str>,
    /// `x-ms-*` headers; names must already be lowercase.
    pub ms_headers: &'a [(&'a str, &'a str)],
    /// Account name followed by the URL path, e.g. `/myaccount/tickethub`.
    pub canonical_resource: String,
}

impl SignableRequest<'_> {
    /// Build the Shared Key string-to-sign.
    ///
    /// Content-Length is blank when zero. `Date` stays blank because the
    /// request carries `x-ms-date`.
    pub fn string_to_sign(&self) -> String {
        let content_length = match self.content_length {
            0 => String::new(),
            n => n.to_string(),
        };

        let mut headers: Vec<_> = self.ms_headers.to_vec();
        headers.sort_by(|a, b| a.0.cmp(b.0));
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{}\n", value.trim()))
            .collect();

        let fields = [
            self.method,
            "", // Content-Encoding
            "", // Content-Language
            content_length.as_str(),
            "", // Content-MD5
            self.content_type.unwrap_or_default(),
            "", // Date
            "", // If-Modified-Since
            "", // If-Match
            "", // If-None-Match
            "", // If-Unmodified-Since
            "", // Range
        ];

        let mut sts = fields.join("\n");
        sts.push('\n');
        sts.push_str(&canonical_headers);
        sts.push_str(&self.canonical_resource);
        sts
    }
}

/// Format the `Authorization` header value for a string-to-sign.
pub(super) fn authorization(account: &str, key: &[u8], string_to_sign: &str) -> String {
    let signature = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        string_to_sign.as_bytes(),
    );
    format!(
        "SharedKey {account}:{}",
        fast32::base64::RFC4648.encode(signature.as_ref())
    )
}
