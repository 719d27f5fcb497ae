//! Outbound account emails. Delivery happens outside this service, so the
//! links are emitted as structured log events for the mail relay to pick up.

fn link(frontend_url: &str, path: &str, token: &str) -> String {
    format!("{}/{path}/{token}", frontend_url.trim_end_matches('/'))
}

pub fn send_verification_email(frontend_url: &str, email: &str, token: &str) {
    let link = link(frontend_url, "verify-email", token);
    tracing::info!(to = %email, link = %link, kind = "verify_email", "Account email queued");
}

pub fn send_password_reset_email(frontend_url: &str, email: &str, token: &str) {
    let link = link(frontend_url, "reset-password", token);
    tracing::info!(to = %email, link = %link, kind = "reset_password", "Account email queued");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_joins_without_double_slash() {
        assert_eq!(
            link("http://localhost:5173/", "verify-email", "abc"),
            "http://localhost:5173/verify-email/abc"
        );
    }
}
