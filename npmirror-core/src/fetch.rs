use crate::context::RunContext;
use crate::{MirrorError, Result};

/// Archive bodies are large and fetched at most once per path, so they
/// never enter the response cache.
pub fn is_archive_url(url: &str) -> bool {
    url.ends_with(".tgz")
}

/// One HTTP GET with the run's shared client. Successful non-archive,
/// non-binary responses are memoized by URL; concurrent callers for the
/// same URL coalesce onto a single in-flight request. Failures are never
/// cached, so a later call retries the fetch.
pub async fn fetch(ctx: &RunContext, url: &str, binary: bool) -> Result<Vec<u8>> {
    if binary || is_archive_url(url) {
        // Tests seed archive bodies the same way they seed metadata; the
        // cache itself stays metadata-only in production.
        #[cfg(test)]
        if let Some(body) = ctx.primed_response(url) {
            return Ok(body);
        }

        return fetch_uncached(ctx, url).await;
    }

    let cell = ctx.response_cell(url);
    let body = cell
        .get_or_try_init(|| fetch_uncached(ctx, url))
        .await?;

    Ok(body.clone())
}

async fn fetch_uncached(ctx: &RunContext, url: &str) -> Result<Vec<u8>> {
    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|source| MirrorError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(MirrorError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|source| MirrorError::Http {
        url: url.to_string(),
        source,
    })?;

    Ok(body.to_vec())
}
