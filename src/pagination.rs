use failure::{Error, ResultExt};
use reqwest::StatusCode;
use serde::Deserialize;
use std::marker::PhantomData;
use std::thread;
use std::time::Duration;
use std::vec::IntoIter;

use crate::client::HttpClient;
use crate::errors::FailedRequest;

/// An iterator over every item of a paginated endpoint, following the
/// `rel="next"` entries of each response's `link` header.
///
/// A `202 Accepted` response means the server is still preparing the data,
/// so the same URL is requested again after `retry_delay` instead of moving
/// on to the next page.
pub struct Paginated<C, I>
where
    C: HttpClient,
    I: for<'de> Deserialize<'de>,
{
    client: C,
    retry_delay: Duration,
    _phantom: PhantomData<I>,
    next_endpoint: Option<String>,
    items: IntoIter<I>,
}

impl<C, I> Paginated<C, I>
where
    C: HttpClient,
    for<'de> I: Deserialize<'de>,
{
    pub fn new(client: C, endpoint: &str, retry_delay: Duration) -> Self {
        Paginated {
            client,
            retry_delay,
            _phantom: PhantomData,
            next_endpoint: Some(String::from(endpoint)),
            items: Vec::new().into_iter(),
        }
    }

    fn send_request(&mut self, endpoint: &str) -> Result<Vec<I>, Error> {
        loop {
            let response = self
                .client
                .get(endpoint)
                .with_context(|_| format!("Unable to fetch {}", endpoint))?;

            if response.status == StatusCode::ACCEPTED {
                debug!("{} is not ready yet, waiting", endpoint);
                thread::sleep(self.retry_delay);
                continue;
            }

            if !response.status.is_success() {
                warn!("Request failed with {}", response.status);

                let err = FailedRequest {
                    status: response.status,
                    url: endpoint.to_string(),
                };

                return Err(err.into());
            }

            let got = serde_json::from_str(&response.body)
                .context("Unable to deserialize response")?;

            self.next_endpoint = response
                .link
                .as_ref()
                .and_then(|link| next_link(link))
                .map(String::from);

            return Ok(got);
        }
    }
}

impl<C, I> Iterator for Paginated<C, I>
where
    C: HttpClient,
    for<'de> I: Deserialize<'de>,
{
    type Item = Result<I, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(next_item) = self.items.next() {
                return Some(Ok(next_item));
            }

            let next_endpoint = self.next_endpoint.take()?;

            match self.send_request(&next_endpoint) {
                // an empty page may still link to another one
                Ok(values) => self.items = values.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Fetch every page and concatenate the results, failing if any page fails.
pub fn fetch_all<C, I>(client: C, endpoint: &str, retry_delay: Duration) -> Result<Vec<I>, Error>
where
    C: HttpClient,
    for<'de> I: Deserialize<'de>,
{
    Paginated::new(client, endpoint, retry_delay).collect()
}

/// Find the URL tagged `rel="next"` in a `link` header.
pub fn next_link(link: &str) -> Option<&str> {
    link.split(',')
        .filter(|value| is_next(value))
        .filter_map(|value| {
            let start = value.find('<')?;
            let end = value.find('>')?;
            value.get(start + 1..end)
        })
        .next()
}

fn is_next(link_value: &str) -> bool {
    link_value
        .split(';')
        .skip(1)
        .filter_map(|param| {
            let mut parts = param.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if key.trim() == "rel" => Some(value),
                _ => None,
            }
        })
        .any(|rels| rels.trim().trim_matches('"').split_whitespace().any(|rel| rel == "next"))
}
