use crate::domain::model::LogoSource;
use crate::domain::ports::Storage;
use crate::utils::error::{LogoError, Result};
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Cache file name and, when the file has to be fetched, where from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePlan {
    pub file_name: String,
    pub remote: Option<String>,
}

/// Replaces characters that are not allowed in file names.
pub fn clean_file_name(name: &str) -> String {
    const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', ' '];
    name.chars()
        .map(|c| if INVALID.contains(&c) { '-' } else { c })
        .collect()
}

fn url_file_name(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "image".to_string());

    let name = if segment.contains('.') {
        segment
    } else {
        format!("{}.jpg", segment)
    };
    clean_file_name(&name)
}

/// Resolves logo sources to files in the image cache, downloading on a miss.
pub struct ImageResolver {
    client: Client,
    logo_service_url: String,
}

impl ImageResolver {
    pub fn new(logo_service_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            logo_service_url: logo_service_url.to_string(),
        })
    }

    fn logo_url(&self, domain: &str) -> String {
        self.logo_service_url.replace("{domain}", domain)
    }

    /// Works out the cache file name and remote location for a source.
    pub fn plan(&self, source: &LogoSource) -> Result<CachePlan> {
        match source {
            LogoSource::Email(address) => {
                let domain = address
                    .rsplit_once('@')
                    .map(|(_, d)| d.trim().to_lowercase())
                    .filter(|d| d.contains('.'))
                    .ok_or_else(|| {
                        LogoError::input(format!("customer domain doesn't contain a '.': {}", address))
                    })?;
                tracing::info!("'@' in parameter: {}", domain);
                Ok(self.domain_plan(&domain))
            }
            LogoSource::BareDomain(domain) => {
                let domain = domain.trim().to_lowercase();
                let domain = domain.strip_prefix("www.").unwrap_or(&domain);
                tracing::info!("domain name only: {}", domain);
                Ok(self.domain_plan(domain))
            }
            LogoSource::Url(url) => Ok(CachePlan {
                file_name: url_file_name(url),
                remote: Some(url.to_string()),
            }),
            LogoSource::LocalFile(name) => Ok(CachePlan {
                file_name: name.clone(),
                remote: None,
            }),
            LogoSource::Text(_) => Err(LogoError::input("text cannot be used as an image source")),
        }
    }

    fn domain_plan(&self, domain: &str) -> CachePlan {
        CachePlan {
            file_name: format!("{}.png", domain),
            remote: Some(self.logo_url(domain)),
        }
    }

    /// Returns the cached file for `source`, downloading it first if needed.
    /// A file with the same name in the cache is always used as is.
    pub async fn resolve<S: Storage>(&self, storage: &S, source: &LogoSource) -> Result<PathBuf> {
        let plan = self.plan(source)?;

        if storage.exists(&plan.file_name) {
            tracing::info!("local file exists, using '{}'", plan.file_name);
            return Ok(storage.full_path(&plan.file_name));
        }

        let Some(remote) = plan.remote else {
            return Err(LogoError::input(format!(
                "local file does not exist: '{}'",
                storage.full_path(&plan.file_name).display()
            )));
        };

        tracing::info!("⬇️ downloading image {} from {}", plan.file_name, remote);
        let data = self.download(&remote).await?;
        storage.write_file(&plan.file_name, &data).await?;
        Ok(storage.full_path(&plan.file_name))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LogoError::network(url, e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(LogoError::network(
                url,
                format!("download failed with status {}", response.status().as_u16()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LogoError::network(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
