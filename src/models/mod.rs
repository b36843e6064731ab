pub mod attendance;
pub mod notification;
pub mod registration;
pub mod role_grant;
pub mod user;
pub mod workshop;

pub use attendance::{Attendance, AttendanceWithUser, CheckInMethod};
pub use notification::{Notification, RewardJob, KIND_XP_AWARDED};
pub use registration::Registration;
pub use role_grant::{Role, RoleGrant};
pub use user::User;
pub use workshop::{
    CreateWorkshopRequest, LocationMode, QrTokenIssued, TokenVerification, UpdateWorkshopRequest,
    Workshop, WorkshopFields, WorkshopStats, WorkshopSummary,
};
