/// Largest char boundary of `value` not past `max`.
pub fn char_boundary_before(value: &str, max: usize) -> usize {
    if value.len() <= max {
        return value.len();
    }
    let mut i = max;
    while !value.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Converts an identifier written in camel or pascal case into snake case.
///
/// A run of capitals is kept together as one word until the last capital that starts a new
/// lowercase word: `HTTPRequest` becomes `http_request`, `UserID1` becomes `user_id1`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let previous = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            if previous.is_ascii_lowercase()
                || previous.is_ascii_digit()
                || (previous.is_ascii_uppercase() && next_lower)
            {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
    }
    result
}

#[macro_export]
macro_rules! possibly_parenthesized {
    ($buff:expr, $cond:expr, $v:expr) => {
        if $cond {
            $buff.push('(');
            $v;
            $buff.push(')');
        } else {
            $v;
        }
    };
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$crate::char_boundary_before(&$query, 497)].trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::{char_boundary_before, snake_case};

    #[test]
    fn snake_case_conversions() {
        assert_eq!(snake_case("CamelCase"), "camel_case");
        assert_eq!(snake_case("ID"), "id");
        assert_eq!(snake_case("HTTPRequest"), "http_request");
        assert_eq!(snake_case("UserID1"), "user_id1");
        assert_eq!(snake_case("simpleTest123X"), "simple_test123_x");
        assert_eq!(snake_case("username"), "username");
        assert_eq!(snake_case("TestModel"), "test_model");
        assert_eq!(snake_case(""), "");
    }

    #[test]
    fn boundaries_stay_on_chars() {
        assert_eq!(char_boundary_before("short", 497), 5);
        assert_eq!(char_boundary_before("aéb", 2), 1);
        assert_eq!(char_boundary_before("aéb", 3), 3);
    }
}
