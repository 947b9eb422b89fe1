//! REST client for the record store. One resource collection per entity
//! type; stage changes go through a dedicated sub-resource so the store
//! can treat them as a cheap single-field patch.

use entity::{Company, Contact, Deal, Stage};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    CompanyDraft, CompanyStore, ContactDraft, ContactStore, DealDraft, DealStore, StoreConfig,
    StoreError, StoreResult,
};

#[derive(Clone, Debug)]
pub struct HttpRecordStore {
    client: Client,
    config: StoreConfig,
}

#[derive(Serialize)]
struct StagePatch {
    stage: Stage,
}

impl HttpRecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.base_url, path);
        debug!(target: "store", %method, %url, "record store request");
        let builder = self.client.request(method, url);
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Vec<T>> {
        let response = self.request(Method::GET, path).send().await?;
        decode(response, None).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, id: i64) -> StoreResult<T> {
        let response = self
            .request(Method::GET, &format!("{path}/{id}"))
            .send()
            .await?;
        decode(response, Some((entity_name(path), id))).await
    }

    async fn create<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> StoreResult<T> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        decode(response, None).await
    }

    async fn replace<T: DeserializeOwned>(
        &self,
        path: &str,
        id: i64,
        body: &impl Serialize,
    ) -> StoreResult<T> {
        let response = self
            .request(Method::PUT, &format!("{path}/{id}"))
            .json(body)
            .send()
            .await?;
        decode(response, Some((entity_name(path), id))).await
    }

    async fn remove(&self, path: &str, id: i64) -> StoreResult<()> {
        let response = self
            .request(Method::DELETE, &format!("{path}/{id}"))
            .send()
            .await?;
        check(response, Some((entity_name(path), id))).await?;
        Ok(())
    }
}

/// Collection path -> singular entity name for error messages.
fn entity_name(path: &str) -> &'static str {
    match path {
        "deals" => "deal",
        "contacts" => "contact",
        "companies" => "company",
        _ => "record",
    }
}

async fn check(
    response: Response,
    entity: Option<(&'static str, i64)>,
) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some((entity, id)) = entity {
            return Err(StoreError::NotFound { entity, id });
        }
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    entity: Option<(&'static str, i64)>,
) -> StoreResult<T> {
    let response = check(response, entity).await?;
    Ok(response.json().await?)
}

impl DealStore for HttpRecordStore {
    async fn list_deals(&self) -> StoreResult<Vec<Deal>> {
        self.list("deals").await
    }

    async fn get_deal(&self, id: i64) -> StoreResult<Deal> {
        self.get("deals", id).await
    }

    async fn create_deal(&self, draft: DealDraft) -> StoreResult<Deal> {
        self.create("deals", &draft).await
    }

    async fn update_deal(&self, id: i64, draft: DealDraft) -> StoreResult<Deal> {
        self.replace("deals", id, &draft).await
    }

    async fn delete_deal(&self, id: i64) -> StoreResult<()> {
        self.remove("deals", id).await
    }

    async fn update_stage(&self, id: i64, stage: Stage) -> StoreResult<Deal> {
        let response = self
            .request(Method::PATCH, &format!("deals/{id}/stage"))
            .json(&StagePatch { stage })
            .send()
            .await?;
        decode(response, Some(("deal", id))).await
    }
}

impl ContactStore for HttpRecordStore {
    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        self.list("contacts").await
    }

    async fn get_contact(&self, id: i64) -> StoreResult<Contact> {
        self.get("contacts", id).await
    }

    async fn create_contact(&self, draft: ContactDraft) -> StoreResult<Contact> {
        self.create("contacts", &draft).await
    }

    async fn update_contact(&self, id: i64, draft: ContactDraft) -> StoreResult<Contact> {
        self.replace("contacts", id, &draft).await
    }

    async fn delete_contact(&self, id: i64) -> StoreResult<()> {
        self.remove("contacts", id).await
    }
}

impl CompanyStore for HttpRecordStore {
    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        self.list("companies").await
    }

    async fn get_company(&self, id: i64) -> StoreResult<Company> {
        self.get("companies", id).await
    }

    async fn create_company(&self, draft: CompanyDraft) -> StoreResult<Company> {
        self.create("companies", &draft).await
    }

    async fn update_company(&self, id: i64, draft: CompanyDraft) -> StoreResult<Company> {
        self.replace("companies", id, &draft).await
    }

    async fn delete_company(&self, id: i64) -> StoreResult<()> {
        self.remove("companies", id).await
    }
}
