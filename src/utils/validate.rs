use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static SUBDOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("Invalid subdomain regex")
});

const RESERVED_SUBDOMAINS: [&str; 6] = ["www", "api", "admin", "app", "mail", "static"];

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 组织子域名：小写字母、数字和连字符，首尾不能是连字符
pub fn validate_subdomain(subdomain: &str) -> Result<(), &'static str> {
    if subdomain.len() < 2 {
        return Err("Subdomain must be at least 2 characters long");
    }
    if !SUBDOMAIN_RE.is_match(subdomain) {
        return Err("Subdomain must contain only lowercase letters, digits or hyphens");
    }
    if RESERVED_SUBDOMAINS.contains(&subdomain) {
        return Err("Subdomain is reserved");
    }
    Ok(())
}

pub fn validate_full_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.chars().count() > 120 {
        return Err("Name must be at most 120 characters long");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 至少 8 个字符，必须同时包含大写字母、小写字母和数字。
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    let weak_passwords = ["password1", "qwerty123", "admin123", "abcd1234", "colegio123"];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("profe@colegio.edu").is_ok());
        assert!(validate_email("a.b+c@sub.dominio.es").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("x@y").is_err());
    }

    #[test]
    fn test_subdomain() {
        assert!(validate_subdomain("colegio-norte").is_ok());
        assert!(validate_subdomain("ies2").is_ok());
        assert!(validate_subdomain("Colegio").is_err());
        assert!(validate_subdomain("-norte").is_err());
        assert!(validate_subdomain("norte-").is_err());
        assert!(validate_subdomain("a").is_err());
        assert!(validate_subdomain("admin").is_err());
    }

    #[test]
    fn test_full_name() {
        assert!(validate_full_name("María López").is_ok());
        assert!(validate_full_name("   ").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("SecurePass123").is_valid);

        let result = validate_password("abcd");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );

        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }
}
