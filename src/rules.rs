//! Rule identifiers offered in the menu and their backend routing.

/// Rules offered by `/rules`, in menu order.
pub const RULES: [&str; 7] = [
    "AWS-AWSManagedRulesCommonRuleSet",
    "AWS-AWSManagedRulesSQLiRuleSet",
    "AWS-AWSManagedRulesLinuxRuleSet",
    "AWS-AWSManagedRulesKnownBadInputsRuleSet",
    "AWS-AWSManagedRulesAmazonIpReputationList",
    "RateLimit_base",
    "Cloudflare-Block-Request",
];

/// Backend that owns a rule's events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// AWS WAF sampled requests
    Waf,
    /// Cloudflare firewall event log
    FirewallLog,
}

impl Backend {
    /// Backends to query for a selected rule, WAF first.
    ///
    /// Unknown identifiers yield no backend.
    ///
    /// # Examples
    ///
    /// ```
    /// use waf_alert_bot::rules::Backend;
    ///
    /// assert_eq!(Backend::for_rule("RateLimit_base"), vec![Backend::Waf]);
    /// assert!(Backend::for_rule("Unknown-Rule").is_empty());
    /// ```
    #[must_use]
    pub fn for_rule(rule: &str) -> Vec<Self> {
        let mut backends = Vec::with_capacity(2);
        if rule.contains("AWS") || rule == "RateLimit_base" {
            backends.push(Self::Waf);
        }
        if rule.contains("Cloudflare") {
            backends.push(Self::FirewallLog);
        }
        backends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing() {
        assert_eq!(
            Backend::for_rule("AWS-AWSManagedRulesSQLiRuleSet"),
            vec![Backend::Waf]
        );
        assert_eq!(
            Backend::for_rule("Cloudflare-Block-Request"),
            vec![Backend::FirewallLog]
        );
        assert!(Backend::for_rule("Unknown-Rule").is_empty());
    }

    #[test]
    fn test_every_listed_rule_is_routed() {
        for rule in RULES {
            assert_eq!(Backend::for_rule(rule).len(), 1, "{rule}");
        }
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(Backend::for_rule("aws-lowercase").is_empty());
        assert!(Backend::for_rule("RateLimit_base_v2").is_empty());
    }

    #[test]
    fn test_rule_matching_both_backends_runs_waf_first() {
        assert_eq!(
            Backend::for_rule("AWS-Cloudflare-Mirror"),
            vec![Backend::Waf, Backend::FirewallLog]
        );
    }
}
