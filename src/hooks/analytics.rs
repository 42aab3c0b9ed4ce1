use crate::api::analytics::{self, AnalyticsSummary, HealthScore, TrendPeriod, TrendPoint};
use crate::cache::keys;

use super::{QueryClient, QueryHandle};

pub fn summary_query<'a>(
    client: &'a QueryClient,
    repository_id: Option<&str>,
) -> QueryHandle<'a, AnalyticsSummary> {
    let repo = repository_id.map(String::from);
    client.query(keys::analytics_summary(repository_id), move |api| {
        analytics::summary(api, repo.as_deref())
    })
}

pub fn trends_query<'a>(
    client: &'a QueryClient,
    period: TrendPeriod,
    repository_id: Option<&str>,
) -> QueryHandle<'a, Vec<TrendPoint>> {
    let repo = repository_id.map(String::from);
    client.query(keys::analytics_trends(period, repository_id), move |api| {
        analytics::trends(api, period, repo.as_deref())
    })
}

pub fn health_query<'a>(
    client: &'a QueryClient,
    repository_id: Option<&str>,
) -> QueryHandle<'a, HealthScore> {
    let repo = repository_id.map(String::from);
    client.query(keys::health_score(repository_id), move |api| {
        analytics::health_score(api, repo.as_deref())
    })
}
