//! `## type[http]`
use super::{required, write_result, Action, ActionError};
use crate::command::CommandRunner;
use crate::context::ResolvedContext;
use reqwest::blocking::multipart::Form;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

pub const METHOD: &str = "method";
pub const URL: &str = "url";
pub const HEADERS: &str = "headers";
pub const BODY: &str = "body";
pub const BODY_FILE: &str = "bodyFile";
pub const FORM: &str = "form";

/// Sends one request and stores `status`, `headers` and `body` of the response in `RESULTDIR`
pub struct HttpAction;

impl Action for HttpAction {
    fn name(&self) -> &str {
        "http"
    }

    fn fields(&self) -> Vec<String> {
        [METHOD, URL, HEADERS, BODY, BODY_FILE, FORM]
            .map(String::from)
            .to_vec()
    }

    fn new_api(&self) -> &str {
        include_str!("../../templates/http_new_api.md")
    }

    fn run(&self, context: &ResolvedContext, _runner: &dyn CommandRunner) -> Result<(), ActionError> {
        let url = required(context, URL)?;
        let method = context.get(METHOD).unwrap_or("GET");
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| ActionError::InvalidMethod(method.to_string()))?;
        let mut headers = parse_headers(context.get(HEADERS).unwrap_or_default())?;

        let client = reqwest::blocking::Client::new();
        let mut request = client.request(method.clone(), url);

        if let Some(body) = context.get(BODY) {
            request = request.body(body.to_string());
        } else if let Some(path) = context.get(BODY_FILE) {
            let file = std::fs::File::open(path).map_err(|source| ActionError::Io {
                path: path.into(),
                source,
            })?;
            request = request.body(file);
        } else if let Some(form) = context.get(FORM) {
            if headers.remove(CONTENT_TYPE).is_some() {
                tracing::debug!("content type of multipart form replaces the declared one");
            }
            request = request.multipart(parse_form(form)?);
        }

        tracing::info!(%method, url, "sending request");
        let response = request.headers(headers).send()?;
        tracing::info!(status = %response.status(), "response received");

        write_result(context, "status", response.status().to_string())?;

        let mut response_headers = String::new();
        for (name, value) in response.headers() {
            response_headers.push_str(&format!(
                "{}: {}\n",
                name,
                String::from_utf8_lossy(value.as_bytes())
            ));
        }
        write_result(context, "headers", response_headers)?;

        let body = response.bytes()?;
        write_result(context, "body", body)
    }
}

/// `Name: value` per line, blank lines are skipped
fn parse_headers(headers: &str) -> Result<HeaderMap, ActionError> {
    let mut map = HeaderMap::new();
    for line in headers.lines().filter(|line| !line.trim().is_empty()) {
        let invalid = || ActionError::InvalidLine {
            field: HEADERS,
            line: line.to_string(),
        };

        let (name, value) = line.split_once(':').ok_or_else(invalid)?;
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
        map.append(name, value);
    }
    Ok(map)
}

/// `key: value` per line; a key `@path` attaches the file at `path`, a value `\@...` is sent as `@...`
fn parse_form(form: &str) -> Result<Form, ActionError> {
    let mut multipart = Form::new();
    for line in form.lines().filter(|line| !line.trim().is_empty()) {
        let (key, value) = line.split_once(':').ok_or_else(|| ActionError::InvalidLine {
            field: FORM,
            line: line.to_string(),
        })?;
        let (key, value) = (key.trim(), value.trim());

        multipart = match key.strip_prefix('@') {
            Some(path) => multipart.file("file", path).map_err(|source| ActionError::Io {
                path: path.into(),
                source,
            })?,
            None => {
                let value = value.strip_prefix('\\').filter(|v| v.starts_with('@')).unwrap_or(value);
                multipart.text(key.to_string(), value.to_string())
            }
        };
    }
    Ok(multipart)
}
