pub mod documents;
pub mod geocoder;
pub mod mailer;
pub mod response;
pub mod slug;
