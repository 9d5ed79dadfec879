//! Booking inquiries: the public room catalogue and inquiry form, and the
//! elevated page that works through the captured leads.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HmsError, Result};
use crate::executor::{Query, QueryExecutor, RowSet};
use crate::navigator::{PageId, RolePolicy};
use crate::notice::Notices;
use crate::session::Session;

const LIST_INQUIRIES: &str = "
    select InquiryID, FullName, GuestPhone, ServiceName, BookingDate
        from Booking_Inquiries
        where ? is null
        or instr(lower(FullName), lower(?)) > 0
        or instr(GuestPhone, ?) > 0
        order by BookingDate desc, InquiryID desc
";

#[derive(Debug, Clone, Deserialize)]
pub struct InquiryForm {
    pub guest_name: String,
    pub phone: String,
    pub room: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Amenities {
    pub outlets: Vec<String>,
    pub spa_services: RowSet,
}

pub struct Inquiries<'a> {
    executor: &'a QueryExecutor,
    policy: &'a RolePolicy,
}

impl<'a> Inquiries<'a> {
    pub fn new(executor: &'a QueryExecutor, policy: &'a RolePolicy) -> Self {
        Self { executor, policy }
    }

    pub fn room_types(&self, session: &Session, notices: &mut Notices) -> Result<RowSet> {
        let query = Query::select("select TypeName, BasePrice, Description from Room_Types order by TypeID");
        self.executor.fetch(session, &query, notices)
    }

    pub fn amenities(&self, session: &Session, notices: &mut Notices) -> Result<Amenities> {
        let outlets = self
            .executor
            .fetch(session, &Query::select("select OutletName from Restaurant_Outlets order by OutletID"), notices)?
            .column("OutletName")
            .into_iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        let spa_services = self.executor.fetch(
            session,
            &Query::select("select ServiceName, Price from Spa_Services order by SpaID"),
            notices,
        )?;
        Ok(Amenities { outlets, spa_services })
    }

    /// Record a reservation inquiry. Name and phone must both be present.
    pub fn submit(&self, session: &Session, form: &InquiryForm, notices: &mut Notices) -> Result<()> {
        let name = form.guest_name.trim();
        let phone = form.phone.trim();
        if name.is_empty() || phone.is_empty() {
            return Err(HmsError::Validation(
                "Please enter both your Full Name and Mobile Number.".to_string(),
            ));
        }
        let query = Query::mutate(
            "insert into Booking_Inquiries (ServiceName, GuestPhone, FullName) values (?, ?, ?)",
        )
        .bind(form.room.as_str())
        .bind(phone)
        .bind(name);
        if self.executor.apply(session, &query, notices).is_err() {
            notices.error("Technical issue with database sync. Please try again.");
            return Err(HmsError::Incomplete);
        }
        info!(room = %form.room, "booking inquiry received");
        notices.success(format!(
            "We have received your inquiry for {}, {name}. Our staff will call you on {phone} shortly.",
            form.room
        ));
        Ok(())
    }

    /// Captured leads, newest first. `search` matches the name
    /// case-insensitively or the phone number by substring.
    pub fn list(&self, session: &Session, search: Option<&str>, notices: &mut Notices) -> Result<RowSet> {
        self.policy.permits(session, PageId::GuestInquiries)?;
        let needle = search.map(str::trim).filter(|s| !s.is_empty());
        let query = Query::select(LIST_INQUIRIES).bind(needle).bind(needle).bind(needle);
        let rows = self.executor.fetch(session, &query, notices)?;
        if rows.is_empty() {
            notices.info("No guest inquiries found in the database yet.");
        }
        Ok(rows)
    }
}
