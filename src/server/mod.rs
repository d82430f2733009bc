// SPDX-License-Identifier: MIT

//! HTTP surface for creating, combining and evaluating rules

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{EngineError, RuleError};
use crate::rules::{self, Node, Record};
use crate::service::RuleService;
use crate::store::StoredRule;

const RULE_STRING_REQUIRED: &str = "rule_string is required";
const RULES_REQUIRED: &str = "A list of rules is required";
const AST_AND_DATA_REQUIRED: &str = "Both ast and data are required";

/// Build the application router
pub fn router(service: RuleService) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/get_rules", get(get_rules))
        .route("/get_rules/{id}", get(get_rule))
        .route("/create_rule", post(create_rule))
        .route("/combine_rules", post(combine_rules))
        .route("/evaluate_rule", post(evaluate_rule))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

pub async fn serve(addr: SocketAddr, service: RuleService) -> Result<(), EngineError> {
    let app = router(service);

    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RulesResponse {
    pub rules: Vec<StoredRule>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RuleResponse {
    pub rule: StoredRule,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AstResponse {
    pub ast: Node,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CombinedResponse {
    pub combined_ast: Node,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EligibilityResponse {
    pub is_eligible: bool,
}

#[derive(Debug, Deserialize)]
struct CreateRuleRequest {
    rule_string: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CombineRulesRequest {
    rules: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct EvaluateRuleRequest {
    ast: Option<Node>,
    data: Option<Record>,
}

/// Error returned from handlers, rendered as `{"error": ...}`
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

/// Parse a JSON request body. Trees nest one level per connective, so the
/// body is read without a nesting limit.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    rules::from_json_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

impl From<RuleError> for ApiError {
    fn from(err: RuleError) -> Self {
        let status = match err {
            RuleError::MissingInput(_) | RuleError::EmptyRuleSet | RuleError::InvalidTree(_) => {
                StatusCode::BAD_REQUEST
            }
            RuleError::MalformedOperand { .. } | RuleError::UnresolvableComparison { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Rule(rule_err) => rule_err.into(),
            other => {
                log::error!("Request failed: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: other.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_rules(State(service): State<RuleService>) -> Result<Json<RulesResponse>, ApiError> {
    let rules = service.list_rules().await?;
    Ok(Json(RulesResponse { rules }))
}

async fn get_rule(
    State(service): State<RuleService>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<RuleResponse>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let rule = service
        .get_rule(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Rule {} not found", id)))?;
    Ok(Json(RuleResponse { rule }))
}

async fn create_rule(
    State(service): State<RuleService>,
    body: Bytes,
) -> Result<Json<AstResponse>, ApiError> {
    let payload: CreateRuleRequest = parse_body(&body)?;
    let rule_string = payload
        .rule_string
        .as_ref()
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(RULE_STRING_REQUIRED))?;

    let ast = service.create_rule(rule_string).await?;
    Ok(Json(AstResponse { ast }))
}

async fn combine_rules(
    State(service): State<RuleService>,
    body: Bytes,
) -> Result<Json<CombinedResponse>, ApiError> {
    let payload: CombineRulesRequest = parse_body(&body)?;
    let rules: Vec<&str> = payload
        .rules
        .as_ref()
        .and_then(Value::as_array)
        .filter(|rules| !rules.is_empty())
        .ok_or_else(|| ApiError::bad_request(RULES_REQUIRED))?
        .iter()
        .map(|rule| rule.as_str().ok_or_else(|| ApiError::bad_request(RULES_REQUIRED)))
        .collect::<Result<_, _>>()?;

    let combined_ast = service.combine_rules(&rules)?;
    Ok(Json(CombinedResponse { combined_ast }))
}

async fn evaluate_rule(
    State(service): State<RuleService>,
    body: Bytes,
) -> Result<Json<EligibilityResponse>, ApiError> {
    let payload: EvaluateRuleRequest = parse_body(&body)?;
    let (Some(ast), Some(data)) = (payload.ast, payload.data.filter(|data| !data.is_empty()))
    else {
        return Err(ApiError::bad_request(AST_AND_DATA_REQUIRED));
    };

    let is_eligible = service.evaluate_rule(&ast, &data)?;
    Ok(Json(EligibilityResponse { is_eligible }))
}
