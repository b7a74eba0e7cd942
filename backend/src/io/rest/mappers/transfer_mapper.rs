use crate::domain::commands::transfers::CreateTransferCommand;
use crate::domain::models::Transfer;
use shared::{CreateTransferRequest, TransferRecord};

/// Mapper between transfer DTOs and domain transfers.
pub struct TransferMapper;

impl TransferMapper {
    /// Binds the command to the authenticated account, whatever origin the body named
    pub fn to_create_command(
        request: &CreateTransferRequest,
        authenticated_account_id: i64,
    ) -> CreateTransferCommand {
        CreateTransferCommand {
            origin_account_id: authenticated_account_id,
            destination_account_id: request.account_destination_id,
            amount: request.amount,
        }
    }

    pub fn to_dto(domain: Transfer) -> TransferRecord {
        TransferRecord {
            id: domain.id,
            account_origin_id: domain.origin_account_id,
            account_destination_id: domain.destination_account_id,
            amount: domain.amount,
            created_at: domain.created_at,
        }
    }
}
