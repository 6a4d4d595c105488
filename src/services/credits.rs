//! 积分周期续期后台任务

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::storage::Storage;

/// 续期所有到期组织，返回续期数量
pub async fn renew_due_organizations(storage: &Arc<dyn Storage>, period_days: i64) -> Result<usize> {
    let now = chrono::Utc::now().timestamp();
    let renewed = storage.renew_due_organizations(now, period_days).await?;
    if renewed.is_empty() {
        debug!("No organizations due for credit renewal");
    } else {
        info!("Renewed credits for organizations {:?}", renewed);
    }
    Ok(renewed.len())
}

/// 按 `credits.renewal_check_interval` 周期检查续期，随进程退出
pub fn spawn_renewal_task(storage: Arc<dyn Storage>) -> JoinHandle<()> {
    let config = AppConfig::get();
    let period_days = config.credits.period_days;
    let check_interval = Duration::from_secs(config.credits.renewal_check_interval.max(1));

    info!(
        "Starting credit renewal task (interval: {}s, period: {} days)",
        check_interval.as_secs(),
        period_days
    );

    tokio::spawn(async move {
        let mut timer = interval(check_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;
            if let Err(e) = renew_due_organizations(&storage, period_days).await {
                error!("Credit renewal failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::organizations::requests::OrganizationUpdate;

    #[tokio::test]
    async fn test_renews_only_due_organizations() {
        let fixture = crate::test_support::Fixture::new(10, 100).await;
        let storage = fixture.storage.clone();

        assert_eq!(renew_due_organizations(&storage, 30).await.unwrap(), 0);

        storage
            .adjust_organization_credits(fixture.organization.id, fixture.teacher.id, -8, None)
            .await
            .unwrap();
        storage
            .update_organization(
                fixture.organization.id,
                OrganizationUpdate {
                    renewal_date: Some(chrono::Utc::now().timestamp() - 60),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(renew_due_organizations(&storage, 30).await.unwrap(), 1);
        let organization = storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(organization.credits_remaining, organization.credits_per_period);
        assert!(organization.renewal_date > chrono::Utc::now());
    }
}
