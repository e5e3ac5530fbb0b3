//! Booking flow for one tutor.
//!
//! [`BookingFlow`] is what a booking screen drives. It owns the calendar
//! view, the draft, the slot board and the confirmation stage, and every
//! method corresponds to one user action. Side effects are not run
//! implicitly: selecting a date hands back a [`SlotRequestTicket`] and the
//! caller runs [`BookingFlow::fetch_slots`] for it, feeding the outcome back
//! through [`BookingFlow::receive_slots`]. Because fetching needs no access
//! to the flow, the user can keep interacting while a fetch is in flight.
//!
//! Confirmation stages:
//!
//! ```text
//! Idle -> Reviewing(details) -> Submitting -> Confirmed(booking)
//!                                          -> Failed(message)
//! ```
//!
//! A submission that never reports back (its future was dropped, or the
//! caller of [`BookingFlow::begin_submit`] gave up) ends in `Failed` too.

use chrono::NaiveDate;
use shared::{Booking, TimeSlot, TutorDetails};
use tracing::{debug, info, warn};

use crate::backend::config::BookingConfig;
use crate::backend::domain::booking_draft::{derive_details, BookingDraft, DateTransition, DraftError};
use crate::backend::domain::booking_orchestrator::BookingOrchestrator;
use crate::backend::domain::calendar::{
    AvailabilitySnapshot, CalendarError, CalendarFocus, CalendarGrid, CalendarView, DateBounds,
};
use crate::backend::domain::models::{BookingDetails, BookingError, InvalidSlotTime, SlotTime};
use crate::backend::domain::slot_board::{SlotBoard, SlotRequestTicket};
use crate::backend::domain::time_slots::SlotDisplay;
use crate::backend::storage::traits::{
    AvailabilityProvider, BookingStore, ServiceError, ServiceResult, TutorDirectory,
};

/// Shown when a submission stopped before the store answered
const INTERRUPTED_MESSAGE: &str = "The booking request was interrupted. Check your bookings before trying again.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    InvalidTime(#[from] InvalidSlotTime),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("Could not load booking data: {0}")]
    Service(#[from] ServiceError),
    #[error("{0} is not available on the selected date")]
    SlotUnavailable(SlotTime),
    #[error("Choose a date and a time first")]
    Incomplete,
    #[error("Review the booking before confirming it")]
    NotReviewing,
    #[error("The booking is still being submitted")]
    SubmitInFlight,
}

/// Where the user is in confirming the booking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationStage {
    Idle,
    Reviewing(BookingDetails),
    Submitting(BookingDetails),
    Confirmed(Booking),
    /// Submission failed; the message is shown to the user as is
    Failed(String),
}

/// Result of a slot fetch, ready to be handed back to the flow
#[derive(Debug, Clone)]
pub struct SlotFetch {
    pub ticket: SlotRequestTicket,
    pub result: ServiceResult<Vec<TimeSlot>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    Applied,
    /// The response belonged to a superseded date selection
    DiscardedStale,
}

/// Holds the stage while a submission is awaited. Dropped unsettled, the
/// stage moves to `Failed`.
struct PendingSubmit<'a> {
    stage: &'a mut ConfirmationStage,
    settled: bool,
}

impl PendingSubmit<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Booking submission was dropped before the store answered");
            *self.stage = ConfirmationStage::Failed(INTERRUPTED_MESSAGE.to_string());
        }
    }
}

pub struct BookingFlow {
    tutor: TutorDetails,
    calendar: CalendarView,
    draft: BookingDraft,
    slots: SlotBoard,
    stage: ConfirmationStage,
    duration_minutes: u32,
}

impl BookingFlow {
    /// Load the tutor and their availability, focusing the month containing `today`
    pub async fn open<D, A>(
        directory: &D,
        availability: &A,
        tutor_id: &str,
        config: &BookingConfig,
        today: NaiveDate,
    ) -> Result<Self, FlowError>
    where
        D: TutorDirectory + ?Sized,
        A: AvailabilityProvider + ?Sized,
    {
        info!("Opening booking flow for tutor {}", tutor_id);
        let tutor = directory.tutor_details(tutor_id).await?;
        let dates = availability.available_dates(tutor_id, None).await?;
        debug!("Tutor {} has {} bookable dates", tutor_id, dates.len());

        Ok(Self::with_snapshot(
            tutor,
            AvailabilitySnapshot::new(dates),
            DateBounds::from_today(today, config.booking_window_days),
            config.default_duration_minutes,
            today,
        ))
    }

    pub fn with_snapshot(
        tutor: TutorDetails,
        snapshot: AvailabilitySnapshot,
        bounds: DateBounds,
        duration_minutes: u32,
        today: NaiveDate,
    ) -> Self {
        let draft = BookingDraft::new(tutor.id.clone());
        Self {
            tutor,
            calendar: CalendarView::new(CalendarFocus::containing(today), snapshot, bounds),
            draft,
            slots: SlotBoard::new(),
            stage: ConfirmationStage::Idle,
            duration_minutes,
        }
    }

    pub fn tutor(&self) -> &TutorDetails {
        &self.tutor
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn stage(&self) -> &ConfirmationStage {
        &self.stage
    }

    pub fn slots(&self) -> &SlotBoard {
        &self.slots
    }

    pub fn calendar(&self) -> &CalendarView {
        &self.calendar
    }

    pub fn calendar_grid(&self, today: NaiveDate) -> Result<CalendarGrid, FlowError> {
        Ok(self.calendar.grid(self.draft.selected_date(), today)?)
    }

    pub fn previous_month(&mut self) -> CalendarFocus {
        self.calendar.previous_month()
    }

    pub fn next_month(&mut self) -> CalendarFocus {
        self.calendar.next_month()
    }

    fn ensure_not_submitting(&self) -> Result<(), FlowError> {
        match self.stage {
            ConfirmationStage::Submitting(_) => Err(FlowError::SubmitInFlight),
            _ => Ok(()),
        }
    }

    /// Leave a review or an earlier outcome behind once the selection changes
    fn reset_stage(&mut self) {
        if matches!(
            self.stage,
            ConfirmationStage::Reviewing(_) | ConfirmationStage::Confirmed(_) | ConfirmationStage::Failed(_)
        ) {
            self.stage = ConfirmationStage::Idle;
        }
    }

    /// Pick a calendar day. Returns a ticket when slots must be fetched.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<Option<SlotRequestTicket>, FlowError> {
        self.ensure_not_submitting()?;
        if !self.calendar.is_selectable(date, today) {
            return Err(CalendarError::NotSelectable(date).into());
        }

        match self.draft.select_date(date) {
            DateTransition::FetchSlots { date, .. } => {
                self.reset_stage();
                Ok(Some(self.slots.begin(date)))
            }
            DateTransition::Unchanged => Ok(None),
        }
    }

    /// Fetch the slots a ticket asks for. Needs no access to the flow.
    pub async fn fetch_slots<A>(availability: &A, tutor_id: &str, ticket: SlotRequestTicket) -> SlotFetch
    where
        A: AvailabilityProvider + ?Sized,
    {
        let result = availability.available_time_slots(tutor_id, ticket.date()).await;
        SlotFetch { ticket, result }
    }

    /// Apply a finished fetch, unless a newer date selection superseded it
    pub fn receive_slots(&mut self, fetch: SlotFetch) -> SlotUpdate {
        let outcome = match fetch.result {
            Ok(slots) => self.slots.apply(&fetch.ticket, slots),
            Err(e) => {
                warn!("Failed to load slots for {}: {}", fetch.ticket.date(), e);
                self.slots.fail(&fetch.ticket, e.to_string())
            }
        };
        match outcome {
            Ok(()) => SlotUpdate::Applied,
            Err(_) => SlotUpdate::DiscardedStale,
        }
    }

    /// Fetch and apply in one step, for callers that do not interleave actions
    pub async fn load_slots<A>(&mut self, availability: &A, ticket: SlotRequestTicket) -> SlotUpdate
    where
        A: AvailabilityProvider + ?Sized,
    {
        let fetch = Self::fetch_slots(availability, &self.tutor.id, ticket).await;
        self.receive_slots(fetch)
    }

    /// Fetch the selected date again after its last fetch failed
    pub fn retry_slots(&mut self) -> Option<SlotRequestTicket> {
        if !self.slots.needs_retry() {
            return None;
        }
        let date = self.draft.selected_date()?;
        info!("Retrying slot fetch for {}", date);
        Some(self.slots.begin(date))
    }

    pub fn slot_display(&self) -> SlotDisplay {
        self.slots.display()
    }

    /// Pick one of the open slots of the selected date
    pub fn select_time(&mut self, time: &str) -> Result<(), FlowError> {
        self.ensure_not_submitting()?;
        if self.draft.selected_date().is_none() {
            return Err(DraftError::NoDateSelected.into());
        }
        let time: SlotTime = time.parse()?;
        let price = self
            .slots
            .find_open(time)
            .map(|slot| slot.price)
            .ok_or(FlowError::SlotUnavailable(time))?;

        self.draft.select_time(time, price)?;
        self.reset_stage();
        Ok(())
    }

    /// Details of the draft as they will be submitted
    pub fn details(&self) -> Option<BookingDetails> {
        derive_details(&self.draft, &self.tutor, self.duration_minutes)
    }

    /// Move to the review step
    pub fn review(&mut self) -> Result<&BookingDetails, FlowError> {
        self.ensure_not_submitting()?;
        let details = self.details().ok_or(FlowError::Incomplete)?;
        self.stage = ConfirmationStage::Reviewing(details);
        match &self.stage {
            ConfirmationStage::Reviewing(details) => Ok(details),
            _ => Err(FlowError::NotReviewing),
        }
    }

    /// Back out of the review; the selection is kept and nothing is refetched
    pub fn cancel_review(&mut self) -> Result<(), FlowError> {
        self.ensure_not_submitting()?;
        self.stage = ConfirmationStage::Idle;
        Ok(())
    }

    /// Clear a confirmed or failed outcome
    pub fn dismiss(&mut self) -> Result<(), FlowError> {
        self.ensure_not_submitting()?;
        self.stage = ConfirmationStage::Idle;
        Ok(())
    }

    /// Enter `Submitting` with the reviewed details
    pub fn begin_submit(&mut self) -> Result<BookingDetails, FlowError> {
        let details = match &self.stage {
            ConfirmationStage::Reviewing(details) => details.clone(),
            ConfirmationStage::Submitting(_) => return Err(FlowError::SubmitInFlight),
            _ => return Err(FlowError::NotReviewing),
        };
        self.stage = ConfirmationStage::Submitting(details.clone());
        Ok(details)
    }

    /// Record the outcome of a submission started with [`Self::begin_submit`]
    pub fn finish_submit(&mut self, result: Result<Booking, BookingError>) -> Result<Booking, FlowError> {
        match result {
            Ok(booking) => {
                info!("Booking {} confirmed for {} at {}", booking.id, booking.date, booking.time);
                self.stage = ConfirmationStage::Confirmed(booking.clone());
                self.draft.reset();
                self.slots.clear();
                Ok(booking)
            }
            Err(e) => {
                // The draft is left as it was so another time can be picked
                self.stage = ConfirmationStage::Failed(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Give up on a submission whose outcome will not arrive.
    /// Returns false when nothing was being submitted.
    pub fn abandon_submit(&mut self) -> bool {
        if !matches!(self.stage, ConfirmationStage::Submitting(_)) {
            return false;
        }
        warn!("Abandoning booking submission for {}", self.tutor.id);
        self.stage = ConfirmationStage::Failed(INTERRUPTED_MESSAGE.to_string());
        true
    }

    /// Submit the reviewed booking through `orchestrator`
    pub async fn confirm<S>(
        &mut self,
        orchestrator: &BookingOrchestrator<S>,
        notes: Option<String>,
    ) -> Result<Booking, FlowError>
    where
        S: BookingStore + ?Sized,
    {
        let details = self.begin_submit()?;
        let pending = PendingSubmit {
            stage: &mut self.stage,
            settled: false,
        };
        let result = match orchestrator.details_for(&self.draft, &self.tutor) {
            Ok(_) => orchestrator.submit(&details, notes).await,
            Err(e) => {
                // A reviewed draft is always complete; anything else is a state machine bug
                debug_assert!(e.is_recoverable(), "confirming an incomplete draft: {}", e);
                Err(e)
            }
        };
        pending.settle();
        self.finish_submit(result)
    }
}
