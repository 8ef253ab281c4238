use failure::{Error, ResultExt};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, LINK, USER_AGENT};
use reqwest::StatusCode;
use sec::Secret;

/// The bits of an HTTP response the rest of the crate cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    /// The raw `link` header, if the server sent one.
    pub link: Option<String>,
    pub body: String,
}

impl Response {
    pub fn new<S: Into<String>>(status: StatusCode, body: S) -> Response {
        Response {
            status,
            link: None,
            body: body.into(),
        }
    }

    pub fn with_link<S: Into<String>>(mut self, link: S) -> Response {
        self.link = Some(link.into());
        self
    }
}

/// Something which can issue authenticated `GET` requests against the
/// hosting API.
pub trait HttpClient {
    fn get(&self, url: &str) -> Result<Response, Error>;
}

impl<'a, C: HttpClient + ?Sized> HttpClient for &'a C {
    fn get(&self, url: &str) -> Result<Response, Error> {
        (**self).get(url)
    }
}

/// A blocking client for the GitHub REST API using a static bearer token.
pub struct GitHubClient {
    client: Client,
    token: Secret<String>,
    agent: String,
}

impl GitHubClient {
    pub fn new(token: Secret<String>, agent: &str) -> GitHubClient {
        GitHubClient {
            client: Client::new(),
            token,
            agent: agent.to_string(),
        }
    }
}

impl HttpClient for GitHubClient {
    fn get(&self, url: &str) -> Result<Response, Error> {
        debug!("Sending request to {:?}", url);

        let request = self
            .client
            .get(url)
            .header(USER_AGENT, self.agent.as_str())
            .header(ACCEPT, "application/vnd.github.v3+json")
            .bearer_auth(self.token.reveal_str())
            .build()
            .context("Generated invalid request. This is a bug.")?;

        if log_enabled!(::log::Level::Trace) {
            let redacted_header = format!("Request Headers {:#?}", request.headers())
                .replace(self.token.reveal_str(), "XXXXXXXXXX");

            for line in redacted_header.lines() {
                trace!("{}", line);
            }
        }

        let response = self
            .client
            .execute(request)
            .context("Unable to send request")?;

        let status = response.status();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        debug!("Received response ({})", status);

        let body = response.text().context("Unable to read the response body")?;
        trace!("Body: {}", body);

        Ok(Response { status, link, body })
    }
}

impl ::std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("agent", &self.agent)
            .finish()
    }
}
