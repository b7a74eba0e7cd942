use crate::domain::commands::accounts::{AuthenticateCommand, CreateAccountCommand};
use crate::domain::models::{Account, AccountSummary as DomainAccountSummary};
use shared::{AccountSummary, BalanceResponse, CreateAccountRequest, LoginRequest};

/// Mapper between account DTOs and domain account types.
pub struct AccountMapper;

impl AccountMapper {
    pub fn to_create_command(request: CreateAccountRequest) -> CreateAccountCommand {
        CreateAccountCommand {
            name: request.name,
            external_id: request.cpf,
            secret: request.secret,
            initial_balance: request.balance,
        }
    }

    pub fn to_authenticate_command(request: LoginRequest) -> AuthenticateCommand {
        AuthenticateCommand {
            external_id: request.cpf,
            secret: request.secret,
        }
    }

    pub fn to_dto(domain: DomainAccountSummary) -> AccountSummary {
        AccountSummary {
            id: domain.id,
            name: domain.name,
            cpf: domain.external_id,
            balance: domain.balance,
            created_at: domain.created_at,
        }
    }

    /// Drops the credential hash
    pub fn account_to_dto(domain: &Account) -> AccountSummary {
        Self::to_dto(domain.summary())
    }

    pub fn to_balance_dto(account_id: i64, balance: i64) -> BalanceResponse {
        BalanceResponse { id: account_id, balance }
    }
}
