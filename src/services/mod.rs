pub mod access_guard;
pub mod auth_service;
pub mod checkin_service;
pub mod checkin_validator;
pub mod registration_service;
pub mod retry;
pub mod reward_dispatcher;
pub mod token_generator;
pub mod user_service;
pub mod workshop_service;

pub use access_guard::AccessGuard;
pub use auth_service::{AuthService, AuthServiceError, LoginRequest};
pub use checkin_service::CheckInService;
pub use registration_service::RegistrationService;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use reward_dispatcher::{RewardDispatcher, RewardSink};
pub use token_generator::generate_token;
pub use user_service::{CreateUserRequest, UserService, UserServiceError};
pub use workshop_service::WorkshopService;
