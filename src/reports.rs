//! Read-only reports: security logs, the executive dashboard and the quick
//! insights. Filters (date range, department) are always bound parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::datatype::Value;
use crate::error::Result;
use crate::executor::{Query, QueryExecutor, RowSet};
use crate::navigator::{PageId, RolePolicy};
use crate::notice::Notices;
use crate::session::Session;

const FAILED_LOGINS: &str = "
    select Username, IP_Address, AttemptTime
        from Failed_Logins
        order by AttemptTime desc, AttemptID desc
";

const AUDIT_TRAIL: &str = "
    select a.LogTime, coalesce(u.Username, 'anonymous') as Username, a.Action, a.TableAffected
        from Audit_Logs a
        left join System_Users u
        on a.UserID = u.UserID
        order by a.LogTime desc, a.LogID desc
";

const TOTAL_REVENUE: &str = "
    select (select coalesce(sum(TotalBill), 0) from CheckOut_Records)
         + (select coalesce(sum(Amount), 0) from Restaurant_Payments) as Total
";

const OCCUPANCY: &str = "
    select count(*) as Total,
           coalesce(sum(case when Status = 'Occupied' then 1 else 0 end), 0) as Occupied
        from Rooms
";

const TOP_FOODS: &str = "
    select MI.ItemName, sum(OD.Qty) as Sales
        from Order_Details OD
        join Menu_Items MI on OD.ItemID = MI.ItemID
        group by MI.ItemName
        order by Sales desc
        limit 5
";

const OUTLET_REVENUE: &str = "
    select RO.OutletName, sum(RP.Amount) as Revenue
        from Restaurant_Payments RP
        join Orders O on RP.OrderID = O.OrderID
        join Restaurant_Tables RT on O.TableID = RT.TableID
        join Restaurant_Outlets RO on RT.OutletID = RO.OutletID
        group by RO.OutletName
";

/// Report categories of the quick insights page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insight {
    Occupancy,
    GuestServices,
    HousekeepingStatus,
    RestaurantSales,
    StaffDirectory,
    LowStock,
}

impl Insight {
    pub fn label(&self) -> &'static str {
        match self {
            Insight::Occupancy => "Current Occupancy",
            Insight::GuestServices => "Guest Service & Preference History",
            Insight::HousekeepingStatus => "Room Maintenance & Housekeeping Status",
            Insight::RestaurantSales => "Detailed Restaurant Order Breakdown",
            Insight::StaffDirectory => "Staff Directory & Payroll",
            Insight::LowStock => "Low Stock Alerts",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightFilter {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// `None` means all departments.
    pub department: Option<String>,
}

impl Default for InsightFilter {
    fn default() -> Self {
        Self {
            from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            to: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap_or_default(),
            department: None,
        }
    }
}

impl InsightFilter {
    fn day_start(&self) -> String {
        format!("{} 00:00:00", self.from.format("%Y-%m-%d"))
    }
    fn day_end(&self) -> String {
        format!("{} 23:59:59", self.to.format("%Y-%m-%d"))
    }
    fn department(&self) -> Option<&str> {
        self.department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty() && *d != "All Departments")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub occupancy_percent: f64,
    pub total_guests: i64,
    pub pending_tasks: i64,
    pub top_foods: RowSet,
    pub outlet_revenue: RowSet,
}

pub struct Reports<'a> {
    executor: &'a QueryExecutor,
    policy: &'a RolePolicy,
}

impl<'a> Reports<'a> {
    pub fn new(executor: &'a QueryExecutor, policy: &'a RolePolicy) -> Self {
        Self { executor, policy }
    }

    pub fn failed_logins(&self, session: &Session, notices: &mut Notices) -> Result<RowSet> {
        self.policy.permits(session, PageId::SecurityLogs)?;
        self.executor.fetch(session, &Query::select(FAILED_LOGINS), notices)
    }

    pub fn audit_trail(&self, session: &Session, notices: &mut Notices) -> Result<RowSet> {
        self.policy.permits(session, PageId::SecurityLogs)?;
        self.executor.fetch(session, &Query::select(AUDIT_TRAIL), notices)
    }

    pub fn dashboard(&self, session: &Session, notices: &mut Notices) -> Result<DashboardSummary> {
        self.policy.permits(session, PageId::ExecutiveDashboard)?;
        let scalar = |sql: &str, column: &str, notices: &mut Notices| -> Result<Value> {
            let rows = self.executor.fetch(session, &Query::select(sql), notices)?;
            Ok(rows.scalar(column).cloned().unwrap_or(Value::Null))
        };
        let total_revenue = scalar(TOTAL_REVENUE, "Total", notices)?.as_f64().unwrap_or(0.0);
        let occupancy = self.executor.fetch(session, &Query::select(OCCUPANCY), notices)?;
        let rooms = occupancy.scalar("Total").and_then(Value::as_i64).unwrap_or(0);
        let occupied = occupancy.scalar("Occupied").and_then(Value::as_i64).unwrap_or(0);
        let occupancy_percent = if rooms == 0 { 0.0 } else { occupied as f64 * 100.0 / rooms as f64 };
        let total_guests = scalar("select count(*) as c from Guests", "c", notices)?
            .as_i64()
            .unwrap_or(0);
        let pending_tasks = scalar(
            "select count(*) as c from Housekeeping_Tasks where Status != 'Completed'",
            "c",
            notices,
        )?
        .as_i64()
        .unwrap_or(0);
        Ok(DashboardSummary {
            total_revenue,
            occupancy_percent,
            total_guests,
            pending_tasks,
            top_foods: self.executor.fetch(session, &Query::select(TOP_FOODS), notices)?,
            outlet_revenue: self.executor.fetch(session, &Query::select(OUTLET_REVENUE), notices)?,
        })
    }

    /// Department names for the insights filter, prefixed with "All Departments".
    pub fn departments(&self, session: &Session, notices: &mut Notices) -> Result<Vec<String>> {
        self.policy.permits(session, PageId::QuickInsights)?;
        let rows = self
            .executor
            .fetch(session, &Query::select("select DeptName from Departments order by DeptName"), notices)?;
        let mut names = vec!["All Departments".to_string()];
        names.extend(rows.column("DeptName").into_iter().filter_map(|v| v.as_str().map(String::from)));
        Ok(names)
    }

    pub fn insight(
        &self,
        session: &Session,
        insight: Insight,
        filter: &InsightFilter,
        notices: &mut Notices,
    ) -> Result<RowSet> {
        self.policy.permits(session, PageId::QuickInsights)?;
        let query = Self::insight_query(insight, filter);
        let rows = self.executor.fetch(session, &query, notices)?;
        if insight == Insight::LowStock && !rows.is_empty() {
            notices.warning("Warning: Stock levels below minimum threshold!");
        }
        Ok(rows)
    }

    fn insight_query(insight: Insight, filter: &InsightFilter) -> Query {
        match insight {
            Insight::Occupancy => Query::select(
                "select G.FirstName || ' ' || G.LastName as Guest, R.RoomNumber, RT.TypeName,
                        Res.CheckInDate, Res.Status
                    from Reservations Res
                    join Guests G on Res.GuestID = G.GuestID
                    join Rooms R on Res.RoomID = R.RoomID
                    join Room_Types RT on R.TypeID = RT.TypeID
                    where Res.CheckInDate between ? and ?",
            )
            .bind(filter.from.format("%Y-%m-%d").to_string())
            .bind(filter.to.format("%Y-%m-%d").to_string()),
            Insight::GuestServices => Query::select(
                "select G.FirstName || ' ' || G.LastName as Guest,
                        GP.Preference,
                        coalesce(BG.Reason, 'Not Blacklisted') as SecurityStatus,
                        S.ServiceName as LastSpaService,
                        SB.Date as ServiceDate
                    from Guests G
                    left join Guest_Preferences GP on G.GuestID = GP.GuestID
                    left join Blacklisted_Guests BG on G.GuestID = BG.GuestID
                    left join Spa_Bookings SB on G.GuestID = SB.GuestID
                    left join Spa_Services S on SB.SpaID = S.SpaID
                    where SB.Date between ? and ? or SB.Date is null",
            )
            .bind(filter.day_start())
            .bind(filter.day_end()),
            Insight::HousekeepingStatus => Query::select(
                "select R.RoomNumber, R.Status as RoomStatus, HT.Status as TaskStatus,
                        E.FullName as AssignedStaff, D.DeptName as Department
                    from Rooms R
                    left join Housekeeping_Tasks HT on R.RoomID = HT.RoomID
                    left join Employees E on HT.EmpID = E.EmpID
                    left join Departments D on E.DeptID = D.DeptID
                    where ? is null or D.DeptName = ?",
            )
            .bind(filter.department())
            .bind(filter.department()),
            Insight::RestaurantSales => Query::select(
                "select RO.OutletName, MC.CategoryName, MI.ItemName,
                        OD.Qty, OD.Qty * MI.Price as LineTotal, O.OrderTime
                    from Order_Details OD
                    join Menu_Items MI on OD.ItemID = MI.ItemID
                    join Menu_Categories MC on MI.CategoryID = MC.CategoryID
                    join Orders O on OD.OrderID = O.OrderID
                    join Restaurant_Tables RT on O.TableID = RT.TableID
                    join Restaurant_Outlets RO on RT.OutletID = RO.OutletID
                    where O.OrderTime between ? and ?",
            )
            .bind(filter.day_start())
            .bind(filter.day_end()),
            Insight::StaffDirectory => Query::select(
                "select E.FullName, D.DeptName, Des.Title, E.Salary
                    from Employees E
                    join Departments D on E.DeptID = D.DeptID
                    join Designations Des on E.DesigID = Des.DesigID
                    where ? is null or D.DeptName = ?",
            )
            .bind(filter.department())
            .bind(filter.department()),
            Insight::LowStock => Query::select(
                "select S.ItemName, IC.CatName, I.Qty, S.MinQty
                    from Current_Inventory I
                    join Stock_Items S on I.StockID = S.StockID
                    join Inventory_Cats IC on S.InvCatID = IC.InvCatID
                    where I.Qty <= S.MinQty",
            ),
        }
    }
}
