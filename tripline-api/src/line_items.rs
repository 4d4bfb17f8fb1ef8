use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use tripline_core::{build_payloads, Envelope, LineItemDraft, LineItemParams};
use tripline_crm::aggregate;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/functions/add-line-items", post(add_line_items))
        .route("/functions/delete-line-items", post(delete_line_items))
        .route("/functions/get-deal-line-items", post(get_deal_line_items))
}

// ============================================================================
// Request Types
// ============================================================================

/// An already-created line item named for deletion, as the UI table holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRef {
    pub hs_object_id: String,
    #[serde(default)]
    pub hs_product_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLineItemsRequest {
    pub deal_id: Option<String>,
    pub line_items: Option<Vec<LineItemRef>>,
    #[serde(default)]
    pub is_flight_group: bool,
    pub product_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDealLineItemsRequest {
    pub deal_id: Option<String>,
}

// ============================================================================
// Handlers — every outcome becomes an envelope, nothing escapes
// ============================================================================

/// POST /functions/add-line-items
/// Validate a submission and create its line item(s) on the deal.
pub async fn add_line_items(
    State(state): State<AppState>,
    Json(params): Json<LineItemParams>,
) -> Json<Envelope> {
    let draft = match LineItemDraft::validate(&params, &state.validation) {
        Ok(draft) => draft,
        Err(err) => return Json(Envelope::fail(err.to_string())),
    };

    let deal_id = draft.deal_id().to_string();
    let payloads = build_payloads(&draft);

    let mut created = Vec::with_capacity(payloads.len());
    for payload in &payloads {
        match state.crm.create_line_item(payload, &deal_id).await {
            Ok(value) => created.push(value),
            Err(err) => {
                tracing::error!(%deal_id, error = %err, "failed to add line item");
                return Json(Envelope::fail_with("Failed to add line item", err.detail()));
            }
        }
    }

    let envelope = match created.as_slice() {
        [single] => Envelope::ok_with(
            format!("Line item '{}' added to deal {}", payloads[0].name(), deal_id),
            single.clone(),
        ),
        _ => Envelope::ok_with("Line items created successfully.", json!(created)),
    };
    Json(envelope)
}

/// POST /functions/delete-line-items
/// Delete a batch of line items (a whole flight group or one item) in
/// parallel; all-or-error.
pub async fn delete_line_items(
    State(state): State<AppState>,
    Json(req): Json<DeleteLineItemsRequest>,
) -> Json<Envelope> {
    let (deal_id, items) = match (&req.deal_id, &req.line_items) {
        (Some(deal_id), Some(items)) if !items.is_empty() => (deal_id, items),
        _ => {
            return Json(Envelope::fail(
                "Missing required parameters: lineItems or dealId",
            ))
        }
    };

    let ids: Vec<String> = items.iter().map(|i| i.hs_object_id.clone()).collect();
    if let Err(err) = state.crm.delete_line_items(&ids).await {
        tracing::error!(%deal_id, error = %err, "failed to delete line items");
        return Json(Envelope::fail_with(err.delete_message(), err.detail()));
    }

    let message = if req.is_flight_group {
        format!("Successfully deleted flight group with {} passengers", items.len())
    } else {
        format!(
            "Successfully deleted {} line item",
            req.product_type.as_deref().unwrap_or("the")
        )
    };

    let deleted: Vec<_> = items
        .iter()
        .map(|i| {
            json!({
                "id": i.hs_object_id,
                "type": i.hs_product_type,
                "name": i.name,
            })
        })
        .collect();

    Json(Envelope::ok_with(
        message,
        json!({ "dealId": deal_id, "deletedItems": deleted }),
    ))
}

/// POST /functions/get-deal-line-items
/// All line items of a deal, grouped by product type (flights by group).
pub async fn get_deal_line_items(
    State(state): State<AppState>,
    Json(req): Json<GetDealLineItemsRequest>,
) -> Json<Envelope> {
    let Some(deal_id) = req.deal_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Json(Envelope::fail("Missing required parameter: dealId"));
    };

    match aggregate::get_deal_line_items(&state.crm, deal_id).await {
        Ok(grouped) => {
            let data = match serde_json::to_value(&grouped) {
                Ok(v) => v,
                Err(err) => {
                    tracing::error!(deal_id, error = %err, "failed to serialize grouped line items");
                    return Json(Envelope::fail("Failed to retrieve line items"));
                }
            };
            Json(Envelope::ok_with(
                format!("Line items retrieved and grouped successfully for deal {deal_id}"),
                data,
            ))
        }
        Err(err) => {
            tracing::error!(deal_id, error = %err, "failed to retrieve line items");
            Json(Envelope::fail_with("Failed to retrieve line items", err.detail()))
        }
    }
}
