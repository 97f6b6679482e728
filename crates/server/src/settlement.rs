//! Settlement API endpoints

use api_types::settlement::{
    Balance as BalanceView, Diagnostic as DiagnosticView, GroupSettlement as GroupSettlementView,
    SettleRequest, SettlementView, Transfer as TransferView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{
    Diagnostic, EngineError, LedgerEntry, Profile, Settlement,
    settlement::{self, Balance, round_cents},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn diagnostic_view(diagnostic: &Diagnostic) -> DiagnosticView {
    match diagnostic {
        Diagnostic::EmptyMembers => DiagnosticView::EmptyMembers,
        Diagnostic::UnknownPayer { index, payer } => DiagnosticView::UnknownPayer {
            index: *index,
            payer: payer.clone(),
        },
        Diagnostic::InvalidAmount { index, amount } => DiagnosticView::InvalidAmount {
            index: *index,
            amount: *amount,
        },
    }
}

fn to_view(plan: &Settlement, balances: &[Balance]) -> SettlementView {
    SettlementView {
        settled: plan.is_settled(),
        transfers: plan
            .transfers
            .iter()
            .map(|transfer| TransferView {
                from: transfer.from.clone(),
                to: transfer.to.clone(),
                amount: transfer.amount_rounded(),
                instruction: transfer.to_string(),
            })
            .collect(),
        balances: balances
            .iter()
            .map(|balance| BalanceView {
                member: balance.member.clone(),
                amount: round_cents(balance.amount),
            })
            .collect(),
        diagnostics: plan.diagnostics.iter().map(diagnostic_view).collect(),
    }
}

/// Handle requests for the settlement plan of a stored group
pub async fn group(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupSettlementView>, ServerError> {
    let result = state.engine.settle_group(&user.username, id).await?;

    Ok(Json(GroupSettlementView {
        group_id: result.group.id,
        name: result.group.name.clone(),
        expense_count: result.expense_count,
        total_minor: result.total.cents(),
        plan: to_view(&result.settlement, &result.balances),
    }))
}

/// Settles a roster and ledger sent in the request, nothing is stored.
pub async fn adhoc(
    Extension(_user): Extension<Profile>,
    Json(payload): Json<SettleRequest>,
) -> Result<Json<SettlementView>, ServerError> {
    let (members, ledger, plan) = match payload {
        SettleRequest::Records { members, ledger } => {
            let ledger: Vec<LedgerEntry> = ledger
                .into_iter()
                .map(|entry| LedgerEntry::new(entry.payer, entry.amount))
                .collect();
            let plan = settlement::settle(&members, &ledger);
            (members, ledger, plan)
        }
        SettleRequest::Parallel {
            members,
            paid_by,
            amounts,
        } => {
            let plan = settlement::settle_parallel(&members, &paid_by, &amounts)
                .map_err(EngineError::from)?;
            let ledger: Vec<LedgerEntry> = paid_by
                .into_iter()
                .zip(amounts)
                .map(|(payer, amount)| LedgerEntry::new(payer, amount))
                .collect();
            (members, ledger, plan)
        }
    };

    let (balances, _) = settlement::compute_balances(&members, &ledger);
    for diagnostic in &plan.diagnostics {
        tracing::warn!(%diagnostic, "ad-hoc settlement entry skipped");
    }

    Ok(Json(to_view(&plan, &balances)))
}
