// Shop Track - Auth Commands
// Login and logout. The opaque credential error comes straight from the
// provider; logout only clears in-memory session state.

use crate::error::Result;

use super::AppState;

pub fn login(state: &mut AppState, email: &str, password: &str) -> Result<()> {
    let session = state.auth.login(email, password)?;
    log::info!("Signed in as {}", session.email);
    state.session = Some(session);
    Ok(())
}

/// Pure navigation: no store or blob state changes.
pub fn logout(state: &mut AppState) {
    if let Some(session) = state.session.take() {
        log::info!("Signed out {}", session.email);
    }
}

pub fn current_email(state: &AppState) -> Option<&str> {
    state.session.as_ref().map(|s| s.email.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::open_state;
    use crate::error::ShopTrackError;

    #[test]
    fn login_sets_session_and_logout_clears_it() {
        let (_tmp, mut state) = open_state();

        login(&mut state, "staff@taller.test", "hunter22").unwrap();
        assert_eq!(current_email(&state), Some("staff@taller.test"));

        logout(&mut state);
        assert_eq!(current_email(&state), None);

        // Logout with no session is harmless
        logout(&mut state);
    }

    #[test]
    fn failed_login_leaves_no_session() {
        let (_tmp, mut state) = open_state();

        let result = login(&mut state, "staff@taller.test", "wrong");
        assert!(matches!(result, Err(ShopTrackError::Auth)));
        assert_eq!(current_email(&state), None);
    }
}
