use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Transfer body; the paying account is the authenticated one
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[schema(example = 4_820_193_746_551_i64)]
    pub to_account: i64,
    /// Minor units, must be positive
    #[schema(example = 500)]
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub from_account: i64,
    pub to_account: i64,
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_request_camel_case() {
        let req: TransferRequest =
            serde_json::from_str(r#"{"toAccount": 4820193746551, "amount": 25}"#).unwrap();
        assert_eq!(req.to_account, 4_820_193_746_551);
        assert_eq!(req.amount, 25);
    }

    #[test]
    fn test_transfer_request_rejects_fractional_amount() {
        let res: Result<TransferRequest, _> =
            serde_json::from_str(r#"{"toAccount": 1, "amount": 2.5}"#);
        assert!(res.is_err());
    }
}
