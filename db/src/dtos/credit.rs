use common::misc::CreditTransactionKind;
use uuid::Uuid;

pub struct CreditTransactionCreateRequest {
    pub user_id: Uuid,
    /// Positive for grants and purchases, negative for usage.
    pub amount: i64,
    pub kind: CreditTransactionKind,
    /// Provider identifier making the transaction idempotent.
    pub reference: Option<String>,
    pub description: Option<String>,
}
