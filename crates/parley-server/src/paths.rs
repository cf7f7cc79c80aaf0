use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but RFC 3986 unreserved characters.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Same as [`SEGMENT`] but keeps path separators, for whole paths in a query.
const PATH: &AsciiSet = &SEGMENT.remove(b'/');

/// Login entry point with the original path attached as `next`.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let sep = if login_url.contains('?') { '&' } else { '?' };
    format!("{login_url}{sep}next={}", utf8_percent_encode(next, PATH))
}

pub fn user_followers(username: &str) -> String {
    format!("/users/{}/followers/", utf8_percent_encode(username, SEGMENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_untouched() {
        assert_eq!(user_followers("luke-S_k.y~1"), "/users/luke-S_k.y~1/followers/");
    }

    #[test]
    fn reserved_and_unicode_encoded() {
        assert_eq!(user_followers("a b&c"), "/users/a%20b%26c/followers/");
        assert_eq!(user_followers("é"), "/users/%C3%A9/followers/");
        assert_eq!(user_followers("a/b"), "/users/a%2Fb/followers/");
    }

    #[test]
    fn login_redirect_keeps_slashes() {
        assert_eq!(
            login_redirect("/accounts/login/", "/message/leia/"),
            "/accounts/login/?next=/message/leia/"
        );
    }

    #[test]
    fn login_redirect_encodes_next() {
        assert_eq!(
            login_redirect("/accounts/login/", "/message/han solo/"),
            "/accounts/login/?next=/message/han%20solo/"
        );
    }

    #[test]
    fn login_redirect_appends_to_existing_query() {
        assert_eq!(
            login_redirect("/sso?realm=x", "/inbox/"),
            "/sso?realm=x&next=/inbox/"
        );
    }
}
