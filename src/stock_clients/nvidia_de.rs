//! nvidia.com/de-de specific stock client implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::{Gpu, RetailerResult, StockCheckResult};
use crate::traits::StockClient;

pub const NAME: &str = "nvidia.com/de-de";
pub const API_URL: &str = "https://api.nvidia.partners/edge/product/search?page=1&limit=9&locale=de-de";

/// nvidia.com/de-de product IDs for the watched cards.
pub const fn product_id(gpu: Gpu) -> Option<i64> {
    match gpu {
        Gpu::Rtx3080 => Some(30044),
        Gpu::Rtx3070 => Some(30052),
        Gpu::Rtx3060Ti => Some(33824),
        Gpu::Rtx3090 => None,
    }
}

// Every field may arrive as `null`; null decodes like a missing key.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockResponse {
    #[serde(default)]
    searched_products: Option<SearchedProducts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchedProducts {
    #[serde(default)]
    product_details: Option<Vec<ProductDetail>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDetail {
    #[serde(rename = "productID", default)]
    product_id: Option<i64>,
    #[serde(default)]
    retailers: Option<Vec<Retailer>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Retailer {
    #[serde(default)]
    retailer_name: Option<String>,
    #[serde(default)]
    direct_purchase_link: Option<String>,
    #[serde(default)]
    stock: Option<i64>,
}

impl StockResponse {
    fn product_details(&self) -> &[ProductDetail] {
        self.searched_products
            .as_ref()
            .and_then(|products| products.product_details.as_deref())
            .unwrap_or_default()
    }
}

impl ProductDetail {
    fn retailers(&self) -> &[Retailer] {
        self.retailers.as_deref().unwrap_or_default()
    }
}

impl From<&Retailer> for RetailerResult {
    fn from(retailer: &Retailer) -> Self {
        let stock = u32::try_from(retailer.stock.unwrap_or(0).max(0)).unwrap_or(u32::MAX);
        RetailerResult::new(
            retailer.retailer_name.clone().unwrap_or_default(),
            stock,
            retailer.direct_purchase_link.clone().unwrap_or_default(),
        )
    }
}

/// Stock client for the German NVIDIA storefront API
#[derive(Clone)]
pub struct NvidiaDeStockClient {
    client: Client,
    api_url: String,
}

impl NvidiaDeStockClient {
    /// Create a client against the public search endpoint
    pub fn new() -> Result<Self> {
        Self::with_api_url(API_URL)
    }

    /// Create a client against another search endpoint
    pub fn with_api_url(api_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    async fn fetch(&self) -> Result<StockResponse> {
        let response = self
            .client
            .get(&self.api_url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {NAME} search endpoint"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to fetch {} search results: {}",
                NAME,
                response.status()
            ));
        }

        response
            .json::<StockResponse>()
            .await
            .with_context(|| format!("Failed to decode {NAME} search results"))
    }
}

fn collect_results(response: &StockResponse, gpus: &[Gpu]) -> Vec<StockCheckResult> {
    let details = response.product_details();

    gpus.iter()
        .map(|&gpu| {
            let retailers = match product_id(gpu) {
                Some(id) => details
                    .iter()
                    .filter(|detail| detail.product_id == Some(id))
                    .flat_map(|detail| detail.retailers().iter().map(RetailerResult::from))
                    .collect(),
                None => {
                    debug!("No {} product ID for {}", NAME, gpu);
                    Vec::new()
                }
            };

            StockCheckResult::new(gpu, retailers)
        })
        .collect()
}

#[async_trait]
impl StockClient for NvidiaDeStockClient {
    fn name(&self) -> &str {
        NAME
    }

    async fn check_stock(&self, gpus: &[Gpu]) -> Result<Vec<StockCheckResult>> {
        let response = self.fetch().await?;

        info!(
            "{} returned {} product records",
            NAME,
            response.product_details().len()
        );

        Ok(collect_results(&response, gpus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> NvidiaDeStockClient {
        NvidiaDeStockClient::with_api_url(format!("{}/edge/product/search", server.uri()))
            .expect("client builds")
    }

    async fn mount_json(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/edge/product/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn matching_product_flattens_retailers() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            serde_json::json!({
                "searchedProducts": {
                    "productDetails": [
                        {
                            "productID": 30044,
                            "displayName": "NVIDIA GEFORCE RTX 3080",
                            "retailers": [
                                {
                                    "retailerName": "NBB",
                                    "productId": 30044,
                                    "directPurchaseLink": "https://nbb.example/3080",
                                    "stock": 5
                                },
                                {
                                    "retailerName": "Caseking",
                                    "productId": 30044,
                                    "directPurchaseLink": "https://caseking.example/3080",
                                    "stock": 0
                                }
                            ]
                        }
                    ]
                }
            }),
        )
        .await;

        let results = client_for(&server)
            .check_stock(&[Gpu::Rtx3080])
            .await
            .expect("check succeeds");

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.gpu(), Gpu::Rtx3080);
        assert_eq!(result.retailers().len(), 2);
        assert!(result.should_alert());

        let text = result.alert_string();
        assert!(text.contains("NBB"));
        assert!(!text.contains("Caseking"));
    }

    #[tokio::test]
    async fn no_matching_product_yields_empty_result() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            serde_json::json!({
                "searchedProducts": {
                    "productDetails": [
                        {
                            "productID": 99999,
                            "displayName": "Something else",
                            "retailers": [
                                { "retailerName": "NBB", "productId": 99999, "directPurchaseLink": "", "stock": 3 }
                            ]
                        }
                    ]
                }
            }),
        )
        .await;

        let results = client_for(&server)
            .check_stock(&[Gpu::Rtx3070])
            .await
            .expect("check succeeds");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].gpu(), Gpu::Rtx3070);
        assert!(results[0].retailers().is_empty());
        assert!(!results[0].should_alert());
    }

    #[tokio::test]
    async fn unmapped_gpu_is_not_an_error() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            serde_json::json!({ "searchedProducts": { "productDetails": [] } }),
        )
        .await;

        let results = client_for(&server)
            .check_stock(&[Gpu::Rtx3090, Gpu::Rtx3060Ti])
            .await
            .expect("check succeeds");

        let gpus: Vec<_> = results.iter().map(StockCheckResult::gpu).collect();
        assert_eq!(gpus, [Gpu::Rtx3090, Gpu::Rtx3060Ti]);
        assert!(results.iter().all(|r| r.retailers().is_empty()));
    }

    #[tokio::test]
    async fn malformed_body_fails_the_whole_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).check_stock(&Gpu::ALL).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn server_error_fails_the_whole_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .check_stock(&[Gpu::Rtx3080])
            .await
            .expect_err("503 is an error");
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn negative_stock_is_clamped() {
        let retailer = Retailer {
            retailer_name: Some("NBB".to_string()),
            direct_purchase_link: None,
            stock: Some(-4),
        };
        let result = RetailerResult::from(&retailer);
        assert_eq!(result.stock(), 0);
        assert!(!result.alert());
    }

    #[tokio::test]
    async fn null_fields_decode_as_empty() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            serde_json::json!({
                "searchedProducts": {
                    "productDetails": [
                        {
                            "productID": 30052,
                            "displayName": null,
                            "retailers": [
                                {
                                    "retailerName": "NBB",
                                    "productId": 30052,
                                    "directPurchaseLink": null,
                                    "stock": 2
                                },
                                {
                                    "retailerName": null,
                                    "productId": null,
                                    "directPurchaseLink": "https://caseking.example/3070",
                                    "stock": null
                                }
                            ]
                        },
                        { "productID": 30044, "retailers": null }
                    ]
                }
            }),
        )
        .await;

        let results = client_for(&server)
            .check_stock(&[Gpu::Rtx3070, Gpu::Rtx3080])
            .await
            .expect("null fields are not an error");

        let rtx3070 = &results[0];
        assert!(rtx3070.should_alert());
        assert_eq!(rtx3070.retailers().len(), 2);
        assert_eq!(rtx3070.retailers()[0].link(), "");
        assert_eq!(rtx3070.retailers()[0].stock(), 2);
        assert_eq!(rtx3070.retailers()[1].name(), "");
        assert!(!rtx3070.retailers()[1].alert());

        assert!(results[1].retailers().is_empty());
    }

    #[tokio::test]
    async fn null_product_list_yields_empty_results() {
        let server = MockServer::start().await;
        mount_json(&server, serde_json::json!({ "searchedProducts": null })).await;

        let results = client_for(&server)
            .check_stock(&[Gpu::Rtx3080])
            .await
            .expect("null product list is not an error");
        assert!(results[0].retailers().is_empty());
    }
}
