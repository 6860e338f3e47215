//! Groovy script run through `/scriptText` to assign a global role.
//!
//! Values never become script source: they are embedded as escaped
//! single-quoted Groovy literals, which do not interpolate `$` expressions.

use std::fmt::Write;

/// Printed by the script once the role has been saved.
pub const ROLE_ASSIGNED_MARKER: &str = "ASSIGNED";

/// Renders the script assigning global `role` to `username` through the
/// role-based authorization strategy.
pub fn role_assignment_script(username: &str, role: &str) -> String {
    format!(
        r#"import jenkins.model.*
import com.michelin.cio.hudson.plugins.rolestrategy.*

def strategy = Jenkins.instance.getAuthorizationStrategy()
if (strategy instanceof RoleBasedAuthorizationStrategy) {{
    strategy.doAssignUserRole(RoleBasedAuthorizationStrategy.GLOBAL,
                              {role},
                              {username})
    Jenkins.instance.save()
    println "{marker}"
}}
"#,
        role = groovy_string_literal(role),
        username = groovy_string_literal(username),
        marker = ROLE_ASSIGNED_MARKER,
    )
}

/// Quotes `value` as a single-quoted Groovy string literal.
pub fn groovy_string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(literal, "\\u{:04x}", c as u32);
            }
            c => literal.push(c),
        }
    }
    literal.push('\'');
    literal
}
