use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};

use tripline_core::LineItemProperties;

use crate::aggregate::LineItemRecord;
use crate::config::Config;
use crate::error::CrmError;

/// HUBSPOT_DEFINED association type ids this integration relies on.
pub const LINE_ITEM_TO_DEAL: u32 = 20;
pub const MEETING_TO_CONTACT: u32 = 200;
pub const MEETING_TO_DEAL: u32 = 212;

/// Every line-item property the UI renders; requested on each detail fetch.
pub const LINE_ITEM_PROPERTIES: [&str; 34] = [
    "name",
    "sku",
    "hs_product_type",
    "flight_number",
    "airline_name",
    "departure_airport",
    "arrival_airport",
    "departure_date___time",
    "arrival_date___time",
    "additional_notes_flight",
    "seat_type",
    "passenger_type",
    "quantity",
    "price",
    "hotel_name",
    "hotel_address",
    "check_in_date",
    "check_out_date",
    "room_type",
    "additional_amenities",
    "amount",
    "transport_type",
    "pickup_location",
    "drop_off_location",
    "vehicle_type_details",
    "estimated_travel_duration_minutes",
    "pickup_date___time",
    "createdate",
    "hs_lastmodifieddate",
    "hs_object_id",
    "hs_product_id",
    "flight_group_id",
    "hubspot_owner_id",
    "hs_created_by_user_id",
];

/// Thin client over the HubSpot CRM REST API. Holds the private-app token
/// for the lifetime of one invocation; no internal retries, no caching.
#[derive(Debug, Clone)]
pub struct HubSpotClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    id: String,
    #[serde(default)]
    properties: std::collections::BTreeMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
struct V3AssociationList {
    #[serde(default)]
    results: Vec<V3AssociationEntry>,
}

#[derive(Debug, Deserialize)]
struct V3AssociationEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct V4AssociationList {
    #[serde(default)]
    results: Vec<V4AssociationEntry>,
}

#[derive(Debug, Deserialize)]
struct V4AssociationEntry {
    #[serde(rename = "toObjectId")]
    to_object_id: IdValue,
}

/// HubSpot serializes object ids as numbers in v4 association payloads and
/// as strings elsewhere.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Num(i64),
    Text(String),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            Self::Num(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl HubSpotClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, CrmError> {
        let token = config
            .hubspot
            .access_token
            .clone()
            .ok_or(CrmError::MissingCredential)?;
        Ok(Self::new(config.hubspot.base_url.clone(), token))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Convert a non-2xx response into an `Api` error carrying the remote
    /// error body.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CrmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Err(CrmError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// POST a line item associated to its deal (association type 20).
    pub async fn create_line_item(
        &self,
        properties: &LineItemProperties,
        deal_id: &str,
    ) -> Result<Value, CrmError> {
        let body = json!({
            "properties": properties,
            "associations": [{
                "to": { "id": deal_id },
                "types": [{
                    "associationCategory": "HUBSPOT_DEFINED",
                    "associationTypeId": LINE_ITEM_TO_DEAL,
                }],
            }],
        });

        let response = self
            .http
            .post(self.url("/crm/v3/objects/line_items"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let created: Value = Self::check(response).await?.json().await?;
        tracing::info!(deal_id, name = properties.name(), "line item created");
        Ok(created)
    }

    async fn delete_line_item(&self, id: &str) -> Result<(), CrmError> {
        let response = self
            .http
            .delete(self.url(&format!("/crm/v3/objects/line_items/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Delete a batch of line items in parallel. All-or-error: any failed
    /// DELETE fails the whole batch with the first cause.
    pub async fn delete_line_items(&self, ids: &[String]) -> Result<(), CrmError> {
        let results = join_all(ids.iter().map(|id| self.delete_line_item(id))).await;
        collapse_batch(results)?;
        tracing::info!(count = ids.len(), "line items deleted");
        Ok(())
    }

    /// Fetch one line item's properties. Partial-failure tolerant: any
    /// error yields `None` so a batch fan-out can drop the entry.
    pub async fn get_line_item(&self, id: &str) -> Option<LineItemRecord> {
        let result: Result<LineItemRecord, CrmError> = async {
            let response = self
                .http
                .get(self.url(&format!("/crm/v3/objects/line_items/{id}")))
                .bearer_auth(&self.token)
                .query(&[("properties", LINE_ITEM_PROPERTIES.join(","))])
                .send()
                .await?;
            let object: ObjectResponse = Self::check(response).await?.json().await?;
            Ok(LineItemRecord::new(object.properties))
        }
        .await;

        match result {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(line_item_id = id, error = %err, "line item fetch failed, skipping");
                None
            }
        }
    }

    /// Ids of the line items associated with a deal.
    pub async fn list_deal_line_item_ids(&self, deal_id: &str) -> Result<Vec<String>, CrmError> {
        let response = self
            .http
            .get(self.url(&format!("/crm/v3/objects/deals/{deal_id}/associations/line_items")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let list: V3AssociationList = Self::check(response).await?.json().await?;
        Ok(list.results.into_iter().map(|e| e.id).collect())
    }

    /// A contact's id and requested properties.
    pub async fn get_contact(
        &self,
        contact_id: &str,
    ) -> Result<(String, std::collections::BTreeMap<String, Option<String>>), CrmError> {
        let response = self
            .http
            .get(self.url(&format!("/crm/v3/objects/contacts/{contact_id}")))
            .bearer_auth(&self.token)
            .query(&[("properties", "firstname,lastname,email,phone")])
            .send()
            .await?;
        let object: ObjectResponse = Self::check(response).await?.json().await?;
        Ok((object.id, object.properties))
    }

    /// Ids of the contacts associated with a contact (v4 associations).
    pub async fn list_contact_association_ids(
        &self,
        contact_id: &str,
    ) -> Result<Vec<String>, CrmError> {
        self.list_associations("contacts", contact_id, "contacts").await
    }

    /// Create a meeting engagement; `associations` follow the v3 inline
    /// shape. Returns the new meeting id.
    pub async fn create_meeting(
        &self,
        properties: &Value,
        associations: &[Value],
    ) -> Result<String, CrmError> {
        let body = json!({
            "properties": properties,
            "associations": associations,
        });
        let response = self
            .http
            .post(self.url("/crm/v3/objects/meetings"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let created: ObjectResponse = Self::check(response).await?.json().await?;
        tracing::info!(meeting_id = %created.id, "meeting created");
        Ok(created.id)
    }

    /// Attach one association to an existing meeting (v4 endpoint).
    pub async fn associate_meeting(
        &self,
        meeting_id: &str,
        to_object_type: &str,
        to_object_id: &str,
        association_type_id: u32,
    ) -> Result<(), CrmError> {
        let body = json!([{
            "associationCategory": "HUBSPOT_DEFINED",
            "associationTypeId": association_type_id,
        }]);
        let response = self
            .http
            .put(self.url(&format!(
                "/crm/v4/objects/meetings/{meeting_id}/associations/{to_object_type}/{to_object_id}"
            )))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Ids currently associated with a meeting, for post-create verification.
    pub async fn list_meeting_association_ids(
        &self,
        meeting_id: &str,
        to_object_type: &str,
    ) -> Result<Vec<String>, CrmError> {
        self.list_associations("meetings", meeting_id, to_object_type).await
    }

    async fn list_associations(
        &self,
        from_type: &str,
        from_id: &str,
        to_type: &str,
    ) -> Result<Vec<String>, CrmError> {
        let response = self
            .http
            .get(self.url(&format!(
                "/crm/v4/objects/{from_type}/{from_id}/associations/{to_type}"
            )))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let list: V4AssociationList = Self::check(response).await?.json().await?;
        Ok(list
            .results
            .into_iter()
            .map(|e| e.to_object_id.into_string())
            .collect())
    }
}

/// Collapse per-id delete outcomes into one result, keeping the first
/// failure as the batch's cause.
fn collapse_batch(results: Vec<Result<(), CrmError>>) -> Result<(), CrmError> {
    results.into_iter().collect()
}
