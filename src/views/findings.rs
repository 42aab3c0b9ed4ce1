//! Findings list: filters, paging, selection and bulk triage

use std::collections::BTreeSet;

use crate::api::findings::{BulkUpdateResult, FindingFilters};
use crate::errors::{ClassifiedError, ErrorCode};
use crate::hooks::findings::{bulk_update_status, findings_query, summary_query};
use crate::hooks::{QueryClient, QueryState};
use crate::models::{Finding, FindingStatus, FindingsSummary, ListParams, Page};

pub struct FindingsList<'a> {
    client: &'a QueryClient,
    filters: FindingFilters,
    params: ListParams,
    selection: BTreeSet<String>,
}

impl<'a> FindingsList<'a> {
    pub fn new(client: &'a QueryClient) -> Self {
        Self {
            client,
            filters: FindingFilters::default(),
            params: ListParams::default(),
            selection: BTreeSet::new(),
        }
    }

    pub fn filters(&self) -> &FindingFilters {
        &self.filters
    }

    pub fn params(&self) -> &ListParams {
        &self.params
    }

    /// New filters start from the first page with nothing selected
    pub fn set_filters(&mut self, filters: FindingFilters) {
        if filters != self.filters {
            self.filters = filters;
            self.params.page = 1;
            self.selection.clear();
        }
    }

    pub fn set_params(&mut self, params: ListParams) {
        self.params = params;
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.params.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.params.page += 1;
    }

    pub fn prev_page(&mut self) {
        self.params.page = self.params.page.saturating_sub(1).max(1);
    }

    /// Current page
    pub fn load(&self) -> QueryState<Page<Finding>> {
        findings_query(self.client, &self.filters, &self.params).read()
    }

    /// Severity counts scoped to the repository filter
    pub fn summary(&self) -> QueryState<FindingsSummary> {
        summary_query(self.client, self.filters.repository_id.as_deref()).read()
    }

    pub fn select(&mut self, id: impl Into<String>) {
        self.selection.insert(id.into());
    }

    pub fn deselect(&mut self, id: &str) {
        self.selection.remove(id);
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    pub fn select_page(&mut self, page: &Page<Finding>) {
        self.selection
            .extend(page.items.iter().map(|f| f.id.clone()));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    pub fn selected(&self) -> Vec<String> {
        self.selection.iter().cloned().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Set `status` on every selected finding in one request.
    ///
    /// On success the selection is cleared and the list (plus summaries)
    /// refetches on the next `load`. On failure the selection is kept.
    pub fn bulk_mark(
        &mut self,
        status: FindingStatus,
        reason: Option<&str>,
    ) -> Result<BulkUpdateResult, ClassifiedError> {
        if self.selection.is_empty() {
            return Err(ClassifiedError::from_code(ErrorCode::ValidationFailed)
                .with_message("No findings selected."));
        }
        let ids = self.selected();
        let result = bulk_update_status(self.client, &ids, status, reason)?;
        tracing::info!("Marked {} findings as {}", result.updated, status);
        self.selection.clear();
        Ok(result)
    }
}
