//! HTTP clients for the secondary enrichment services
//!
//! Each client wraps the same thin JSON GET helper: build the lookup key
//! from the annotation, request `{base}/{path}/{key}`, decode the record.
//! A 404 becomes a not-found error the annotator downgrades to an absent
//! field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::AnnotateError;
use crate::model::{HotspotRecord, MutationImpact, VariantAnnotation, VariantInfo};
use crate::Result;

use super::{
    hotspot_key, mutation_impact_key, Enrichment, EnrichmentSource, FIELD_HOTSPOTS,
    FIELD_MUTATION_IMPACT, FIELD_VARIANT_INFO,
};

/// Shared JSON GET client for enrichment endpoints
struct JsonFetcher {
    client: Client,
    base_url: Url,
    service: &'static str,
}

impl JsonFetcher {
    fn new(service: &'static str, base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| AnnotateError::upstream(service, e.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnnotateError::upstream(service, e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            service,
        })
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AnnotateError::upstream(self.service, "base URL cannot carry a path"))?
            .push(key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnnotateError::upstream(self.service, e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AnnotateError::VariantNotFound {
                variant: key.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(AnnotateError::upstream(
                self.service,
                format!("unexpected status {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AnnotateError::upstream(self.service, e.to_string()))
    }
}

/// Client for the mutation-impact scoring service
pub struct MutationImpactSource {
    fetcher: JsonFetcher,
}

impl MutationImpactSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            fetcher: JsonFetcher::new("mutation-impact", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl EnrichmentSource for MutationImpactSource {
    fn name(&self) -> &'static str {
        FIELD_MUTATION_IMPACT
    }

    async fn fetch(&self, annotation: &VariantAnnotation) -> Result<Enrichment> {
        let key = mutation_impact_key(annotation).ok_or_else(|| AnnotateError::VariantNotFound {
            variant: annotation.variant.clone(),
        })?;
        let record: MutationImpact = self.fetcher.get(&key).await?;
        Ok(Enrichment::MutationImpact(record))
    }
}

/// Client for the aggregated variant-info service
pub struct VariantInfoSource {
    fetcher: JsonFetcher,
}

impl VariantInfoSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            fetcher: JsonFetcher::new("variant-info", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl EnrichmentSource for VariantInfoSource {
    fn name(&self) -> &'static str {
        FIELD_VARIANT_INFO
    }

    async fn fetch(&self, annotation: &VariantAnnotation) -> Result<Enrichment> {
        let record: VariantInfo = self.fetcher.get(&annotation.variant).await?;
        Ok(Enrichment::VariantInfo(record))
    }
}

/// Client for the hotspot recurrence service
pub struct HotspotSource {
    fetcher: JsonFetcher,
}

impl HotspotSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            fetcher: JsonFetcher::new("hotspot", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl EnrichmentSource for HotspotSource {
    fn name(&self) -> &'static str {
        FIELD_HOTSPOTS
    }

    async fn fetch(&self, annotation: &VariantAnnotation) -> Result<Enrichment> {
        let key = hotspot_key(annotation).ok_or_else(|| AnnotateError::VariantNotFound {
            variant: annotation.variant.clone(),
        })?;
        let records: Vec<HotspotRecord> = self.fetcher.get(&key).await?;
        Ok(Enrichment::Hotspots(records))
    }
}
