//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod booking_repo;
pub mod category_repo;
pub mod cinema_repo;
pub mod event_repo;
pub mod movie_repo;
pub mod role_repo;
pub mod room_repo;
pub mod seat_repo;
pub mod session_repo;
pub mod user_repo;
pub mod user_session_repo;

pub use booking_repo::BookingRepo;
pub use category_repo::CategoryRepo;
pub use cinema_repo::CinemaRepo;
pub use event_repo::EventRepo;
pub use movie_repo::MovieRepo;
pub use role_repo::RoleRepo;
pub use room_repo::RoomRepo;
pub use seat_repo::SeatRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
pub use user_session_repo::UserSessionRepo;
