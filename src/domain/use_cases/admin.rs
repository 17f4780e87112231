use std::sync::Arc;

use crate::{
    constants::{DASHBOARD_RECENT_PROJECTS, DASHBOARD_TOP_CATEGORIES},
    entities::dashboard::Dashboard,
    errors::AppError,
    repositories::dashboard::DashboardRepository,
};

pub struct AdminHandler<R>
where
    R: DashboardRepository + ?Sized,
{
    pub dashboard_repo: Arc<R>,
}

impl<R> AdminHandler<R>
where
    R: DashboardRepository + ?Sized,
{
    pub fn new(dashboard_repo: Arc<R>) -> Self {
        AdminHandler { dashboard_repo }
    }

    pub async fn dashboard(&self) -> Result<Dashboard, AppError> {
        self.dashboard_repo
            .dashboard(DASHBOARD_RECENT_PROJECTS, DASHBOARD_TOP_CATEGORIES)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::dashboard::CatalogTotals;
    use crate::repositories::dashboard::MockDashboardRepository;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn dashboard_asks_for_five_of_each() {
        let mut repo = MockDashboardRepository::new();
        repo.expect_dashboard()
            .with(eq(5), eq(5))
            .times(1)
            .returning(|_, _| {
                Ok(Dashboard {
                    totals: CatalogTotals {
                        projects: 4,
                        published_projects: 2,
                        featured_projects: 1,
                        categories: 3,
                        videos: 0,
                    },
                    recent_projects: vec![],
                    top_categories: vec![],
                })
            });

        let dashboard = AdminHandler::new(Arc::new(repo)).dashboard().await.unwrap();
        assert_eq!(dashboard.totals.projects, 4);
    }
}
