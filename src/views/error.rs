use rocket::http::Status;
use rocket::response::Responder;
use rocket::Request;

use rocket_dyn_templates::Template;

use serde::Serialize;

use crate::models::Registry;
use crate::views::PageInfo;

/// A notice about something that went wrong.
///
/// Only "not found" is told apart; every other status is reported as an
/// internal server error.
#[derive(Debug, Serialize)]
pub struct ErrorPage {
    pub page_info: PageInfo,
    pub status: u16,
    pub message: String,
}

impl ErrorPage {
    pub fn new(status: i64, registry: &Registry) -> ErrorPage {
        let (status, message) = if status == i64::from(Status::NotFound.code) {
            (Status::NotFound, "Not found")
        } else {
            (Status::InternalServerError, "Internal server error")
        };

        ErrorPage {
            page_info: PageInfo::new("Error", registry),
            status: status.code,
            message: message.to_string(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorPage {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'static> {
        log::trace!("Rendering template at pages/error");

        let status = Status::from_code(self.status).unwrap_or(Status::InternalServerError);

        let mut res = Template::render("pages/error", &self).respond_to(req)?;
        res.set_status(status);

        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        let registry = Registry::default();

        let page = ErrorPage::new(404, &registry);
        assert_eq!((page.status, page.message.as_str()), (404, "Not found"));

        for status in [500, 400, 418, -1, 99_999_999_999] {
            let page = ErrorPage::new(status, &registry);
            assert_eq!(page.status, 500);
            assert_eq!(page.message, "Internal server error");
        }
    }
}
