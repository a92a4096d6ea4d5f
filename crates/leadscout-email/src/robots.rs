//! robots.txt parsing and permission checks.

use reqwest::Client;
use std::collections::HashMap;
use url::Url;

/// Parsed robots.txt rules.
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    /// Rules per user-agent token (lowercase)
    rules: HashMap<String, AgentRules>,

    /// Rules for `*`
    default_rules: AgentRules,
}

/// Rules for one user-agent group.
#[derive(Debug, Clone, Default)]
struct AgentRules {
    /// Disallowed path prefixes
    disallow: Vec<String>,

    /// Allowed path prefixes (override disallow)
    allow: Vec<String>,
}

impl RobotsTxt {
    /// Parse robots.txt content. Unknown directives are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current_agents: Vec<String> = Vec::new();
        let mut current_rules = AgentRules::default();
        let mut in_rules = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group.
                    if in_rules {
                        robots.store(&current_agents, &current_rules);
                        current_agents.clear();
                        current_rules = AgentRules::default();
                        in_rules = false;
                    }
                    current_agents.push(value.to_lowercase());
                }
                "disallow" => {
                    in_rules = true;
                    if !value.is_empty() {
                        current_rules.disallow.push(value.to_string());
                    }
                }
                "allow" => {
                    in_rules = true;
                    if !value.is_empty() {
                        current_rules.allow.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        robots.store(&current_agents, &current_rules);
        robots
    }

    fn store(&mut self, agents: &[String], rules: &AgentRules) {
        for agent in agents {
            if agent == "*" {
                self.default_rules = rules.clone();
            } else {
                self.rules.insert(agent.clone(), rules.clone());
            }
        }
    }

    /// Check if a path is allowed for a user-agent.
    ///
    /// The group is picked by exact token, then by a token contained in the
    /// agent string (so `leaddatasetbuilder` matches `LeadDatasetBuilder/1.0`),
    /// then `*`. Within a group the longest matching prefix wins and `Allow`
    /// wins ties.
    #[must_use]
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let agent_lower = user_agent.to_lowercase();

        let rules = self
            .rules
            .get(&agent_lower)
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|(k, _)| agent_lower.contains(k.as_str()))
                    .map(|(_, v)| v)
            })
            .unwrap_or(&self.default_rules);

        let longest = |prefixes: &[String]| {
            prefixes
                .iter()
                .filter(|p| path.starts_with(p.as_str()))
                .map(String::len)
                .max()
        };

        match (longest(&rules.allow), longest(&rules.disallow)) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(allow), Some(disallow)) => allow >= disallow,
        }
    }
}

/// Fetch and parse robots.txt from the root of `site`.
///
/// A non-success status means there is no robots.txt, which allows
/// everything. Transport errors are returned so the caller can decide.
pub async fn fetch_robots_txt(client: &Client, site: &Url) -> Result<RobotsTxt, reqwest::Error> {
    let mut robots_url = site.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);

    let response = client.get(robots_url).send().await?;
    if !response.status().is_success() {
        return Ok(RobotsTxt::default());
    }
    let content = response.text().await?;
    Ok(RobotsTxt::parse(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "LeadDatasetBuilder/1.0";

    #[test]
    fn test_parse_basic() {
        let content = r"
User-agent: *
Disallow: /intern/
Disallow: /admin/ # backend
Allow: /intern/presse/
        ";

        let robots = RobotsTxt::parse(content);

        assert!(robots.is_allowed(UA, "/"));
        assert!(!robots.is_allowed(UA, "/intern/team"));
        assert!(!robots.is_allowed(UA, "/admin/"));
        assert!(robots.is_allowed(UA, "/intern/presse/2024"));
    }

    #[test]
    fn test_specific_user_agent() {
        let content = r"
User-agent: *
Disallow: /

User-agent: leaddatasetbuilder
Disallow:
        ";

        let robots = RobotsTxt::parse(content);

        assert!(!robots.is_allowed("OtherBot", "/"));
        assert!(robots.is_allowed(UA, "/"));
    }

    #[test]
    fn test_grouped_agents_share_rules() {
        let content = r"
User-agent: googlebot
User-agent: leaddatasetbuilder
Disallow: /

User-agent: *
Allow: /
        ";

        let robots = RobotsTxt::parse(content);
        assert!(!robots.is_allowed(UA, "/"));
        assert!(!robots.is_allowed("Googlebot", "/kontakt"));
        assert!(robots.is_allowed("Bingbot", "/kontakt"));
    }

    #[test]
    fn test_longest_match_wins() {
        let content = r"
User-agent: *
Allow: /
Disallow: /private
        ";

        let robots = RobotsTxt::parse(content);
        assert!(robots.is_allowed(UA, "/"));
        assert!(!robots.is_allowed(UA, "/private/x"));
    }

    #[test]
    fn test_empty_robots() {
        let robots = RobotsTxt::parse("");
        assert!(robots.is_allowed(UA, "/any/path"));
    }

    #[test]
    fn test_disallow_all() {
        let robots = RobotsTxt::parse("User-agent: *\nDisallow: /\n");
        assert!(!robots.is_allowed(UA, "/"));
        assert!(!robots.is_allowed(UA, "/anything"));
    }
}
