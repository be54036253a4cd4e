//! S3 error documents and the responses that carry them.

use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use s3gate_model::error::S3Error;

use crate::body::GatewayBody;

/// Serialise an `<Error>` document.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error><Code>..</Code><Message>..</Message><Resource>..</Resource><RequestId>..</RequestId></Error>
/// ```
#[must_use]
pub fn error_to_xml(err: &S3Error, request_id: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_error_xml(&mut buf, err, request_id) {
        tracing::error!(error = %e, "failed to serialize S3 error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(buf: &mut Vec<u8>, err: &S3Error, request_id: &str) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(err.code.as_str()))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(&err.message))?;
        if let Some(resource) = err.resource.as_deref() {
            w.create_element("Resource")
                .write_text_content(BytesText::new(resource))?;
        }
        w.create_element("RequestId")
            .write_text_content(BytesText::new(
                err.request_id.as_deref().unwrap_or(request_id),
            ))?;
        Ok(())
    })?;
    Ok(())
}

/// Build the HTTP response for an error, status taken from the error.
#[must_use]
pub fn error_to_response(err: &S3Error, request_id: &str) -> http::Response<GatewayBody> {
    let body = GatewayBody::from(error_to_xml(err, request_id));
    http::Response::builder()
        .status(err.status_code)
        .header(http::header::CONTENT_TYPE, "application/xml")
        .body(body)
        .unwrap_or_else(|_| {
            http::Response::builder()
                .status(http::StatusCode::INTERNAL_SERVER_ERROR)
                .body(GatewayBody::empty())
                .expect("static response should be valid")
        })
}

/// The reply for a request no operation accepts: `405 MethodNotAllowed`
/// naming the request path.
#[must_use]
pub fn not_found_response(path: &str, request_id: &str) -> http::Response<GatewayBody> {
    error_to_response(&S3Error::method_not_allowed(path), request_id)
}
