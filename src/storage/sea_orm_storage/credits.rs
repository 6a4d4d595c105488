//! 积分存储操作
//!
//! 组织余额与教师月度用量只通过带条件的 UPDATE 修改，
//! 每次余额变化都在同一事务中写入 credit_transactions。

use super::SeaOrmStorage;
use crate::entity::credit_transactions::{
    ActiveModel as LedgerActiveModel, Column as LedgerColumn, Entity as CreditTransactions,
};
use crate::entity::organizations::{Column as OrgColumn, Entity as Organizations};
use crate::entity::profiles::{Column as ProfileColumn, Entity as Profiles};
use crate::errors::{GraderError, Result};
use crate::models::{
    PaginationInfo,
    credits::{
        entities::{CreditReservation, CreditTransaction, CreditTransactionKind},
        requests::CreditTransactionListQuery,
        responses::CreditTransactionListResponse,
    },
};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

const SECONDS_PER_DAY: i64 = 86_400;

/// 一条待写入的积分流水
struct LedgerEntry {
    organization_id: i64,
    user_id: Option<i64>,
    submission_id: Option<i64>,
    kind: CreditTransactionKind,
    amount: i64,
    balance_after: i64,
    description: Option<String>,
}

async fn insert_ledger_row<C: ConnectionTrait>(
    conn: &C,
    entry: LedgerEntry,
    now: i64,
) -> Result<CreditTransaction> {
    let model = LedgerActiveModel {
        organization_id: Set(entry.organization_id),
        user_id: Set(entry.user_id),
        submission_id: Set(entry.submission_id),
        kind: Set(entry.kind.to_string()),
        amount: Set(entry.amount),
        balance_after: Set(entry.balance_after),
        description: Set(entry.description),
        created_at: Set(now),
        ..Default::default()
    };

    let result = model
        .insert(conn)
        .await
        .map_err(|e| GraderError::database_operation(format!("写入积分流水失败: {e}")))?;

    Ok(result.into_credit_transaction())
}

async fn begin(storage: &SeaOrmStorage) -> Result<DatabaseTransaction> {
    storage
        .db
        .begin()
        .await
        .map_err(|e| GraderError::database_operation(format!("开启事务失败: {e}")))
}

async fn commit(txn: DatabaseTransaction) -> Result<()> {
    txn.commit()
        .await
        .map_err(|e| GraderError::database_operation(format!("提交事务失败: {e}")))
}

async fn rollback(txn: DatabaseTransaction) -> Result<()> {
    txn.rollback()
        .await
        .map_err(|e| GraderError::database_operation(format!("回滚事务失败: {e}")))
}

async fn organization_balance<C: ConnectionTrait>(conn: &C, organization_id: i64) -> Result<i64> {
    Organizations::find_by_id(organization_id)
        .select_only()
        .column(OrgColumn::CreditsRemaining)
        .into_tuple::<i64>()
        .one(conn)
        .await
        .map_err(|e| GraderError::database_operation(format!("查询组织余额失败: {e}")))?
        .ok_or_else(|| GraderError::not_found(format!("组织 {organization_id} 不存在")))
}

async fn organization_renewal_date<C: ConnectionTrait>(
    conn: &C,
    organization_id: i64,
) -> Result<i64> {
    Organizations::find_by_id(organization_id)
        .select_only()
        .column(OrgColumn::RenewalDate)
        .into_tuple::<i64>()
        .one(conn)
        .await
        .map_err(|e| GraderError::database_operation(format!("查询续期日期失败: {e}")))?
        .ok_or_else(|| GraderError::not_found(format!("组织 {organization_id} 不存在")))
}

/// 下一个续期时间：跳过所有已经错过的周期
pub(crate) fn next_renewal_date(renewal_date: i64, now: i64, period_days: i64) -> i64 {
    let period = std::cmp::max(period_days, 1).saturating_mul(SECONDS_PER_DAY);
    if renewal_date > now {
        return renewal_date;
    }
    let missed = (now - renewal_date) / period + 1;
    renewal_date.saturating_add(missed.saturating_mul(period))
}

impl SeaOrmStorage {
    /// 原子预留评分积分
    ///
    /// 先检查组织余额（不足返回 402），再检查教师月度额度（不足返回 403），
    /// 任一失败都回滚，不修改任何数据。
    pub async fn reserve_grading_credits_impl(
        &self,
        organization_id: i64,
        teacher_id: i64,
        submission_id: i64,
        cost: i64,
    ) -> Result<CreditReservation> {
        if cost <= 0 {
            return Err(GraderError::validation("积分消耗必须为正数"));
        }

        let now = chrono::Utc::now().timestamp();
        let txn = begin(self).await?;

        let org_update = Organizations::update_many()
            .col_expr(
                OrgColumn::CreditsRemaining,
                Expr::col(OrgColumn::CreditsRemaining).sub(cost),
            )
            .col_expr(OrgColumn::UpdatedAt, Expr::value(now))
            .filter(OrgColumn::Id.eq(organization_id))
            .filter(OrgColumn::CreditsRemaining.gte(cost))
            .exec(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("扣减组织积分失败: {e}")))?;

        if org_update.rows_affected == 0 {
            rollback(txn).await?;
            let available = organization_balance(&self.db, organization_id).await?;
            return Err(GraderError::insufficient_credits(format!(
                "组织积分不足：需要 {cost}，剩余 {available}"
            )));
        }

        let profile_update = Profiles::update_many()
            .col_expr(
                ProfileColumn::MonthlyCreditsUsed,
                Expr::col(ProfileColumn::MonthlyCreditsUsed).add(cost),
            )
            .col_expr(ProfileColumn::UpdatedAt, Expr::value(now))
            .filter(ProfileColumn::UserId.eq(teacher_id))
            .filter(
                Expr::col(ProfileColumn::MonthlyCreditsUsed)
                    .add(cost)
                    .lte(Expr::col(ProfileColumn::MonthlyCreditLimit)),
            )
            .exec(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新教师用量失败: {e}")))?;

        if profile_update.rows_affected == 0 {
            rollback(txn).await?;
            let profile = Profiles::find_by_id(teacher_id)
                .one(&self.db)
                .await
                .map_err(|e| GraderError::database_operation(format!("查询教师资料失败: {e}")))?
                .ok_or_else(|| GraderError::not_found(format!("教师 {teacher_id} 不存在")))?;
            return Err(GraderError::monthly_limit_exceeded(format!(
                "教师月度额度不足：需要 {cost}，已用 {}/{}",
                profile.monthly_credits_used, profile.monthly_credit_limit
            )));
        }

        let credits_remaining = organization_balance(&txn, organization_id).await?;
        let renewal_date = organization_renewal_date(&txn, organization_id).await?;
        let profile = Profiles::find_by_id(teacher_id)
            .one(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询教师资料失败: {e}")))?
            .ok_or_else(|| GraderError::not_found(format!("教师 {teacher_id} 不存在")))?;

        insert_ledger_row(
            &txn,
            LedgerEntry {
                organization_id,
                user_id: Some(teacher_id),
                submission_id: Some(submission_id),
                kind: CreditTransactionKind::Grading,
                amount: -cost,
                balance_after: credits_remaining,
                description: Some(format!("AI grading of submission {submission_id}")),
            },
            now,
        )
        .await?;

        commit(txn).await?;

        debug!(
            "预留积分成功: org={} teacher={} cost={} remaining={}",
            organization_id, teacher_id, cost, credits_remaining
        );

        Ok(CreditReservation {
            organization_id,
            teacher_id,
            submission_id,
            cost,
            credits_remaining,
            monthly_credits_used: profile.monthly_credits_used,
            monthly_credit_limit: profile.monthly_credit_limit,
            renewal_date,
        })
    }

    /// 退还一次预留（组织 +cost，教师 -cost，写 refund 流水）
    ///
    /// 预留之后组织已经续期时不再退还：新周期的余额与用量已被重置。
    /// 返回是否实际退还。
    pub async fn refund_grading_credits_impl(
        &self,
        reservation: &CreditReservation,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let cost = reservation.cost;
        let txn = begin(self).await?;

        let org_refund = Organizations::update_many()
            .col_expr(
                OrgColumn::CreditsRemaining,
                Expr::col(OrgColumn::CreditsRemaining).add(cost),
            )
            .col_expr(OrgColumn::UpdatedAt, Expr::value(now))
            .filter(OrgColumn::Id.eq(reservation.organization_id))
            .filter(OrgColumn::RenewalDate.eq(reservation.renewal_date))
            .exec(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("退还组织积分失败: {e}")))?;

        if org_refund.rows_affected == 0 {
            rollback(txn).await?;
            info!(
                "组织 {} 在预留后已续期，跳过提交 {} 的 {} 积分退还",
                reservation.organization_id, reservation.submission_id, cost
            );
            return Ok(false);
        }

        // 期间发生过续期时用量可能已被清零，不能减成负数
        let profile_update = Profiles::update_many()
            .col_expr(
                ProfileColumn::MonthlyCreditsUsed,
                Expr::col(ProfileColumn::MonthlyCreditsUsed).sub(cost),
            )
            .col_expr(ProfileColumn::UpdatedAt, Expr::value(now))
            .filter(ProfileColumn::UserId.eq(reservation.teacher_id))
            .filter(ProfileColumn::MonthlyCreditsUsed.gte(cost))
            .exec(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("退还教师用量失败: {e}")))?;
        if profile_update.rows_affected == 0 {
            Profiles::update_many()
                .col_expr(ProfileColumn::MonthlyCreditsUsed, Expr::value(0i64))
                .col_expr(ProfileColumn::UpdatedAt, Expr::value(now))
                .filter(ProfileColumn::UserId.eq(reservation.teacher_id))
                .exec(&txn)
                .await
                .map_err(|e| GraderError::database_operation(format!("退还教师用量失败: {e}")))?;
        }

        let balance_after = organization_balance(&txn, reservation.organization_id).await?;
        insert_ledger_row(
            &txn,
            LedgerEntry {
                organization_id: reservation.organization_id,
                user_id: Some(reservation.teacher_id),
                submission_id: Some(reservation.submission_id),
                kind: CreditTransactionKind::Refund,
                amount: cost,
                balance_after,
                description: Some(format!(
                    "Refund for failed grading of submission {}",
                    reservation.submission_id
                )),
            },
            now,
        )
        .await?;

        commit(txn).await?;
        Ok(true)
    }

    /// 手动调整组织积分
    pub async fn adjust_organization_credits_impl(
        &self,
        organization_id: i64,
        actor_id: i64,
        amount: i64,
        description: Option<String>,
    ) -> Result<CreditTransaction> {
        if amount == 0 {
            return Err(GraderError::validation("调整数量不能为 0"));
        }

        let now = chrono::Utc::now().timestamp();
        let txn = begin(self).await?;

        let mut update = Organizations::update_many()
            .col_expr(
                OrgColumn::CreditsRemaining,
                Expr::col(OrgColumn::CreditsRemaining).add(amount),
            )
            .col_expr(OrgColumn::UpdatedAt, Expr::value(now))
            .filter(OrgColumn::Id.eq(organization_id));
        if amount < 0 {
            update = update.filter(OrgColumn::CreditsRemaining.gte(-amount));
        }

        let result = update
            .exec(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("调整组织积分失败: {e}")))?;

        if result.rows_affected == 0 {
            rollback(txn).await?;
            let available = organization_balance(&self.db, organization_id).await?;
            return Err(GraderError::validation(format!(
                "调整后余额不能为负数：当前 {available}，调整 {amount}"
            )));
        }

        let balance_after = organization_balance(&txn, organization_id).await?;
        let transaction = insert_ledger_row(
            &txn,
            LedgerEntry {
                organization_id,
                user_id: Some(actor_id),
                submission_id: None,
                kind: CreditTransactionKind::Adjustment,
                amount,
                balance_after,
                description,
            },
            now,
        )
        .await?;

        commit(txn).await?;
        Ok(transaction)
    }

    /// 续期所有到期组织
    ///
    /// 每个组织一个事务：余额重置为周期额度，成员月度用量清零，续期日期后移。
    pub async fn renew_due_organizations_impl(
        &self,
        now: i64,
        period_days: i64,
    ) -> Result<Vec<i64>> {
        let due = Organizations::find()
            .filter(OrgColumn::RenewalDate.lte(now))
            .all(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询到期组织失败: {e}")))?;

        let mut renewed = Vec::with_capacity(due.len());

        for org in due {
            let txn = begin(self).await?;
            let next = next_renewal_date(org.renewal_date, now, period_days);

            // 以旧的续期日期为条件，避免并发执行时重复续期
            let result = Organizations::update_many()
                .col_expr(OrgColumn::CreditsRemaining, Expr::value(org.credits_per_period))
                .col_expr(OrgColumn::RenewalDate, Expr::value(next))
                .col_expr(OrgColumn::UpdatedAt, Expr::value(now))
                .filter(OrgColumn::Id.eq(org.id))
                .filter(OrgColumn::RenewalDate.eq(org.renewal_date))
                .filter(OrgColumn::CreditsPerPeriod.eq(org.credits_per_period))
                .exec(&txn)
                .await
                .map_err(|e| GraderError::database_operation(format!("续期组织失败: {e}")))?;

            if result.rows_affected == 0 {
                rollback(txn).await?;
                continue;
            }

            Profiles::update_many()
                .col_expr(ProfileColumn::MonthlyCreditsUsed, Expr::value(0i64))
                .col_expr(ProfileColumn::UpdatedAt, Expr::value(now))
                .filter(ProfileColumn::OrganizationId.eq(org.id))
                .exec(&txn)
                .await
                .map_err(|e| GraderError::database_operation(format!("重置教师用量失败: {e}")))?;

            insert_ledger_row(
                &txn,
                LedgerEntry {
                    organization_id: org.id,
                    user_id: None,
                    submission_id: None,
                    kind: CreditTransactionKind::Renewal,
                    amount: org.credits_per_period - org.credits_remaining,
                    balance_after: org.credits_per_period,
                    description: Some(format!("Period renewal, next renewal at {next}")),
                },
                now,
            )
            .await?;

            commit(txn).await?;
            info!("组织 {} 积分已续期，下次续期时间 {}", org.id, next);
            renewed.push(org.id);
        }

        Ok(renewed)
    }

    /// 分页列出积分流水
    pub async fn list_credit_transactions_impl(
        &self,
        query: CreditTransactionListQuery,
    ) -> Result<CreditTransactionListResponse> {
        let page = std::cmp::max(query.page.unwrap_or(1), 1) as u64;
        let size = Ord::clamp(query.size.unwrap_or(20), 1, 100) as u64;

        let mut select =
            CreditTransactions::find().filter(LedgerColumn::OrganizationId.eq(query.organization_id));
        if let Some(ref kind) = query.kind {
            select = select.filter(LedgerColumn::Kind.eq(kind.to_string()));
        }

        let paginator = select
            .order_by_desc(LedgerColumn::CreatedAt)
            .order_by_desc(LedgerColumn::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询积分流水总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询积分流水页数失败: {e}")))?;

        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询积分流水失败: {e}")))?;

        Ok(CreditTransactionListResponse {
            items: rows
                .into_iter()
                .map(|m| m.into_credit_transaction())
                .collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 某时间点之后评分的净消耗（扣减减去退还）
    pub async fn sum_grading_credits_since_impl(
        &self,
        organization_id: i64,
        since: i64,
    ) -> Result<i64> {
        let amounts: Vec<i64> = CreditTransactions::find()
            .select_only()
            .column(LedgerColumn::Amount)
            .filter(LedgerColumn::OrganizationId.eq(organization_id))
            .filter(LedgerColumn::CreatedAt.gte(since))
            .filter(LedgerColumn::Kind.is_in([
                CreditTransactionKind::Grading.to_string(),
                CreditTransactionKind::Refund.to_string(),
            ]))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("统计积分消耗失败: {e}")))?;

        Ok(-amounts.into_iter().sum::<i64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GraderError;
    use crate::models::{
        organizations::{entities::SubscriptionPlan, requests::NewOrganization},
        users::{entities::UserRole, requests::NewUser},
    };
    use crate::storage::Storage;

    async fn setup(credits: i64, monthly_limit: i64, renewal_date: i64) -> (SeaOrmStorage, i64, i64) {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let org = storage
            .create_organization(NewOrganization {
                name: "Colegio Sur".to_string(),
                subdomain: format!("sur{renewal_date}"),
                education_level: None,
                subscription_plan: SubscriptionPlan::Basic,
                credits_remaining: credits,
                credits_per_period: 50,
                renewal_date,
            })
            .await
            .unwrap();
        let teacher = storage
            .create_user(NewUser {
                email: "profe@sur.edu".to_string(),
                password_hash: "hash".to_string(),
                full_name: "Profe".to_string(),
                role: UserRole::Teacher,
                organization_id: Some(org.id),
                monthly_credit_limit: monthly_limit,
            })
            .await
            .unwrap();
        (storage, org.id, teacher.id)
    }

    fn future() -> i64 {
        chrono::Utc::now().timestamp() + 86_400
    }

    #[tokio::test]
    async fn test_reserve_debits_both_counters() {
        let (storage, org_id, teacher_id) = setup(10, 200, future()).await;

        let reservation = storage
            .reserve_grading_credits(org_id, teacher_id, 1, 3)
            .await
            .unwrap();

        assert_eq!(reservation.credits_remaining, 7);
        assert_eq!(reservation.monthly_credits_used, 3);

        let ledger = storage
            .list_credit_transactions(CreditTransactionListQuery {
                organization_id: org_id,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ledger.items.len(), 1);
        assert_eq!(ledger.items[0].kind, CreditTransactionKind::Grading);
        assert_eq!(ledger.items[0].amount, -3);
        assert_eq!(ledger.items[0].balance_after, 7);
    }

    #[tokio::test]
    async fn test_insufficient_org_credits_changes_nothing() {
        let (storage, org_id, teacher_id) = setup(10, 200, future()).await;

        let result = storage.reserve_grading_credits(org_id, teacher_id, 1, 12).await;
        assert!(matches!(result, Err(GraderError::InsufficientCredits(_))));

        let org = storage.get_organization_by_id(org_id).await.unwrap().unwrap();
        let teacher = storage.get_user_by_id(teacher_id).await.unwrap().unwrap();
        assert_eq!(org.credits_remaining, 10);
        assert_eq!(teacher.profile.monthly_credits_used, 0);
        assert_eq!(storage.sum_grading_credits_since(org_id, 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_monthly_limit_rolls_back_org_debit() {
        let (storage, org_id, teacher_id) = setup(100, 5, future()).await;

        storage
            .reserve_grading_credits(org_id, teacher_id, 1, 4)
            .await
            .unwrap();
        let result = storage.reserve_grading_credits(org_id, teacher_id, 2, 2).await;
        assert!(matches!(result, Err(GraderError::MonthlyLimitExceeded(_))));

        let org = storage.get_organization_by_id(org_id).await.unwrap().unwrap();
        let teacher = storage.get_user_by_id(teacher_id).await.unwrap().unwrap();
        assert_eq!(org.credits_remaining, 96);
        assert_eq!(teacher.profile.monthly_credits_used, 4);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_overdraw() {
        let (storage, org_id, teacher_id) = setup(10, 1000, future()).await;

        let attempts = (0..8).map(|i| storage.reserve_grading_credits(org_id, teacher_id, i, 3));
        let results = futures_util::future::join_all(attempts).await;

        let granted: i64 = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|r| r.cost)
            .sum();
        assert_eq!(granted, 9);

        let org = storage.get_organization_by_id(org_id).await.unwrap().unwrap();
        assert_eq!(org.credits_remaining, 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, GraderError::InsufficientCredits(_)))
        );
    }

    #[tokio::test]
    async fn test_refund_restores_counters() {
        let (storage, org_id, teacher_id) = setup(10, 200, future()).await;

        let reservation = storage
            .reserve_grading_credits(org_id, teacher_id, 1, 3)
            .await
            .unwrap();
        assert!(storage.refund_grading_credits(&reservation).await.unwrap());

        let org = storage.get_organization_by_id(org_id).await.unwrap().unwrap();
        let teacher = storage.get_user_by_id(teacher_id).await.unwrap().unwrap();
        assert_eq!(org.credits_remaining, 10);
        assert_eq!(teacher.profile.monthly_credits_used, 0);
        assert_eq!(storage.sum_grading_credits_since(org_id, 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refund_after_renewal_keeps_fresh_period() {
        let now = chrono::Utc::now().timestamp();
        let (storage, org_id, teacher_id) = setup(10, 200, now - 10).await;

        let reservation = storage
            .reserve_grading_credits(org_id, teacher_id, 1, 3)
            .await
            .unwrap();
        assert_eq!(reservation.renewal_date, now - 10);

        // 评分进行中组织完成续期
        assert_eq!(
            storage.renew_due_organizations(now, 30).await.unwrap(),
            vec![org_id]
        );
        assert!(!storage.refund_grading_credits(&reservation).await.unwrap());

        let org = storage.get_organization_by_id(org_id).await.unwrap().unwrap();
        let teacher = storage.get_user_by_id(teacher_id).await.unwrap().unwrap();
        assert_eq!(org.credits_remaining, 50);
        assert_eq!(teacher.profile.monthly_credits_used, 0);

        let refunds = storage
            .list_credit_transactions(CreditTransactionListQuery {
                organization_id: org_id,
                kind: Some(CreditTransactionKind::Refund),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(refunds.items.is_empty());
    }

    #[tokio::test]
    async fn test_adjust_rejects_negative_balance() {
        let (storage, org_id, teacher_id) = setup(10, 200, future()).await;

        let tx = storage
            .adjust_organization_credits(org_id, teacher_id, 25, Some("top up".to_string()))
            .await
            .unwrap();
        assert_eq!(tx.balance_after, 35);

        let result = storage
            .adjust_organization_credits(org_id, teacher_id, -40, None)
            .await;
        assert!(matches!(result, Err(GraderError::Validation(_))));

        let org = storage.get_organization_by_id(org_id).await.unwrap().unwrap();
        assert_eq!(org.credits_remaining, 35);
    }

    #[tokio::test]
    async fn test_renewal_only_touches_due_organizations() {
        let now = chrono::Utc::now().timestamp();
        let (storage, due_id, teacher_id) = setup(3, 200, now - 10).await;
        storage
            .reserve_grading_credits(due_id, teacher_id, 1, 2)
            .await
            .unwrap();

        let other = storage
            .create_organization(NewOrganization {
                name: "Colegio Norte".to_string(),
                subdomain: "norte".to_string(),
                education_level: None,
                subscription_plan: SubscriptionPlan::Free,
                credits_remaining: 4,
                credits_per_period: 50,
                renewal_date: now + 86_400,
            })
            .await
            .unwrap();

        let renewed = storage.renew_due_organizations(now, 30).await.unwrap();
        assert_eq!(renewed, vec![due_id]);

        let due = storage.get_organization_by_id(due_id).await.unwrap().unwrap();
        assert_eq!(due.credits_remaining, 50);
        assert_eq!(due.renewal_date.timestamp(), now - 10 + 30 * SECONDS_PER_DAY);

        let teacher = storage.get_user_by_id(teacher_id).await.unwrap().unwrap();
        assert_eq!(teacher.profile.monthly_credits_used, 0);

        let untouched = storage.get_organization_by_id(other.id).await.unwrap().unwrap();
        assert_eq!(untouched.credits_remaining, 4);

        // 再次执行不会重复续期
        assert!(storage.renew_due_organizations(now, 30).await.unwrap().is_empty());
    }

    #[test]
    fn test_next_renewal_date_skips_missed_periods() {
        let period = 30 * SECONDS_PER_DAY;
        assert_eq!(next_renewal_date(1_000, 500, 30), 1_000);
        assert_eq!(next_renewal_date(1_000, 1_000, 30), 1_000 + period);
        assert_eq!(next_renewal_date(0, period * 2 + 5, 30), period * 3);
        // 极端配置不溢出
        assert_eq!(next_renewal_date(0, 5, i64::MAX), i64::MAX);
        assert_eq!(next_renewal_date(0, 5, 0), SECONDS_PER_DAY);
    }

    #[tokio::test]
    async fn test_list_transactions_clamps_paging() {
        let (storage, org_id, teacher_id) = setup(10, 200, future()).await;
        storage
            .reserve_grading_credits(org_id, teacher_id, 1, 2)
            .await
            .unwrap();

        let page = storage
            .list_credit_transactions(CreditTransactionListQuery {
                organization_id: org_id,
                page: Some(-3),
                size: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.page, 1);
    }
}
