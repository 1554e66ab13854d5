//! Administrator review queue for ownership verification requests.
//!
//! Reviewers list requests newest first and move pending ones to a terminal
//! status. Each accepted decision issues exactly one status update.

use std::sync::Arc;

use carwatch_core::VerificationId;
use carwatch_state::{StatusChange, VerificationError, VerificationRequest, VerificationStatus};
use carwatch_store::{DataStore, StoreError};

use crate::error::ReviewError;
use crate::repository::{CarSummary, VerificationRepository};

/// Which requests to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(VerificationStatus),
}

impl Default for StatusFilter {
    /// The queue opens on pending requests.
    fn default() -> Self {
        Self::Only(VerificationStatus::Pending)
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// The review queue.
#[derive(Debug, Clone)]
pub struct VerificationReview {
    repo: VerificationRepository,
}

impl VerificationReview {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            repo: VerificationRepository::new(store),
        }
    }

    /// Requests matching `filter`, newest first.
    pub async fn list(&self, filter: StatusFilter) -> Result<Vec<VerificationRequest>, ReviewError> {
        let status = match filter {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status),
        };
        Ok(self.repo.list(status).await?)
    }

    /// One request with its car, for the detail view.
    pub async fn detail(
        &self,
        id: VerificationId,
    ) -> Result<(VerificationRequest, Option<CarSummary>), ReviewError> {
        let request = self.fetch(id).await?;
        let car = match self.repo.car(request.car_id).await {
            Ok(car) => Some(car),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        Ok((request, car))
    }

    /// `pending → verified`. Both documents must be attached.
    pub async fn approve(&self, id: VerificationId) -> Result<VerificationRequest, ReviewError> {
        self.decide(id, VerificationRequest::approve).await
    }

    /// `pending → rejected`.
    pub async fn reject(&self, id: VerificationId) -> Result<VerificationRequest, ReviewError> {
        self.decide(id, VerificationRequest::reject).await
    }

    /// `pending → expired`.
    pub async fn expire(&self, id: VerificationId) -> Result<VerificationRequest, ReviewError> {
        self.decide(id, VerificationRequest::expire).await
    }

    async fn fetch(&self, id: VerificationId) -> Result<VerificationRequest, ReviewError> {
        self.repo.request(id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => ReviewError::NotFound(id),
            other => ReviewError::Store(other),
        })
    }

    async fn decide(
        &self,
        id: VerificationId,
        transition: fn(&mut VerificationRequest) -> Result<StatusChange, VerificationError>,
    ) -> Result<VerificationRequest, ReviewError> {
        let mut request = self.fetch(id).await?;
        let from = request.status;
        let change = transition(&mut request).map_err(|e| {
            tracing::warn!(%id, %from, error = %e, "review decision refused");
            e
        })?;

        self.repo.set_status(id, change).await.map_err(|e| match e {
            StoreError::NotFound { .. } => ReviewError::NotFound(id),
            other => ReviewError::Store(other),
        })?;

        tracing::info!(%id, %from, to = %change.status, "verification reviewed");
        metrics::counter!(
            "carwatch_review_transitions_total",
            "status" => change.status.as_str()
        )
        .increment(1);
        Ok(request)
    }
}
