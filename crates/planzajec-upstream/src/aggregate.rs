//! Fan-out of several schedule fetches into one aggregate.

use std::collections::HashSet;

use planzajec_core::{
    AggregateSchedule, MAX_SCHEDULES_PER_REQUEST, Schedule, SchedulePeriod, ScheduleType,
    merge_schedules,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{CallParams, UekClient};
use crate::error::{UpstreamError, UpstreamResult};
use crate::query;

/// Checks a list of entity ids before any upstream call is made.
///
/// # Errors
///
/// Returns an invalid-input error for an empty list, more than
/// [`MAX_SCHEDULES_PER_REQUEST`] ids, or a repeated id.
pub fn validate_ids(ids: &[i64]) -> UpstreamResult<()> {
    if ids.is_empty() {
        return Err(UpstreamError::invalid_input("at least one schedule id is required"));
    }
    if ids.len() > MAX_SCHEDULES_PER_REQUEST {
        return Err(UpstreamError::invalid_input(format!(
            "at most {} schedules can be requested at once, got {}",
            MAX_SCHEDULES_PER_REQUEST,
            ids.len()
        )));
    }

    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            return Err(UpstreamError::invalid_input(format!("duplicate schedule id {}", id)));
        }
    }
    Ok(())
}

type FetchTasks = JoinSet<(usize, UpstreamResult<(Schedule, Vec<SchedulePeriod>)>)>;

/// Waits for the cancelled siblings of a failed fetch.
///
/// The first failure is returned unless a sibling had already been
/// rejected as unauthorized.
async fn settle_failure(tasks: &mut FetchTasks, first: UpstreamError) -> UpstreamError {
    if first.is_unauthorized() {
        tasks.shutdown().await;
        return first;
    }

    while let Some(joined) = tasks.join_next().await {
        if let Ok((_, Err(e))) = joined {
            if e.is_unauthorized() {
                tasks.shutdown().await;
                return e;
            }
        }
    }
    first
}

impl UekClient {
    /// Fetches several entities of one type concurrently and merges them.
    ///
    /// The returned periods are those of the first id. The first failure
    /// cancels the remaining fetches and is returned, except that an
    /// unauthorized sibling takes precedence.
    pub async fn fetch_aggregate_schedule(
        &self,
        params: &CallParams,
        schedule_type: ScheduleType,
        ids: &[i64],
        period_index: usize,
        cancel: &CancellationToken,
    ) -> UpstreamResult<(AggregateSchedule, Vec<SchedulePeriod>)> {
        validate_ids(ids)?;
        query::period_number(period_index)?;

        let siblings = cancel.child_token();
        let mut tasks = FetchTasks::new();
        for (position, &id) in ids.iter().enumerate() {
            let client = self.clone();
            let params = params.clone();
            let token = siblings.clone();
            tasks.spawn(async move {
                let result = client
                    .fetch_schedule(&params, schedule_type, id, period_index, &token)
                    .await;
                (position, result)
            });
        }

        let mut fetched: Vec<Option<(Schedule, Vec<SchedulePeriod>)>> =
            ids.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let (position, result) = match joined {
                Ok(output) => output,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => (0, Err(UpstreamError::cancelled())),
            };

            match result {
                Ok(schedule) => fetched[position] = Some(schedule),
                Err(e) => {
                    siblings.cancel();
                    return Err(settle_failure(&mut tasks, e).await);
                }
            }
        }

        let mut schedules = Vec::with_capacity(ids.len());
        let mut periods = Vec::new();
        for (position, slot) in fetched.into_iter().enumerate() {
            let (schedule, entity_periods) = slot.ok_or_else(UpstreamError::cancelled)?;
            if position == 0 {
                periods = entity_periods;
            }
            schedules.push(schedule);
        }

        let aggregate = merge_schedules(schedules);
        debug!(
            schedule_type = schedule_type.code(),
            schedules = aggregate.headers.len(),
            items = aggregate.items.len(),
            periods = periods.len(),
            "Aggregated schedules"
        );

        Ok((aggregate, periods))
    }
}
