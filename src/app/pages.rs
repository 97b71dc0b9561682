//! Server-rendered pages for the flows a browser reaches directly.
//!
//! Kept deliberately plain; a templating engine would be overkill for
//! two pages.

/// A titled confirmation page.
pub fn info_page(title: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n<p>{message}</p>\n</body>\n</html>"
    )
}

/// The password reset form, optionally with an error banner.
pub fn reset_form(error: Option<&str>) -> String {
    let banner = match error {
        Some(e) => format!("<p class=\"error\">{e}</p>\n"),
        None => String::new(),
    };
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Reset password</title></head>\n\
         <body>\n<h1>Reset password</h1>\n{banner}\
         <form method=\"post\">\n\
         <input type=\"password\" name=\"password\" placeholder=\"New password\" />\n\
         <input type=\"password\" name=\"password-confirm\" placeholder=\"Confirm password\" />\n\
         <button type=\"submit\">Update</button>\n\
         </form>\n</body>\n</html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_page_carries_title_and_message() {
        let page = info_page("Email verified", "All good");
        assert!(page.contains("<h1>Email verified</h1>"));
        assert!(page.contains("<p>All good</p>"));
    }

    #[test]
    fn reset_form_shows_error_only_when_present() {
        assert!(!reset_form(None).contains("class=\"error\""));
        assert!(reset_form(Some("Password is missing")).contains("Password is missing"));
    }
}
