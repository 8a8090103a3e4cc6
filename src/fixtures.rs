#[cfg(test)]
pub mod test {
    use serde_json::json;

    use crate::check::Check;
    use crate::dict::ConfigDict;
    use crate::rules::{Checker, Rule, RuleDefault, RuleSet};

    /// A small tree touching every rule shape: scalars with defaults, a
    /// nested section, a list of sections and a list with a fixed value-set.
    pub fn pot_rules() -> RuleSet {
        RuleSet::from_json(&json!({
            "potatoes": ["How many potatoes?", "int", 0],
            "carrots": ["How many carrots?", "int", 99],
            "liquids": ["Fluids we like", false, {
                "water": ["Liters", "int", 0],
                "vodka": ["Liters", "int", 12]
            }],
            "tags": ["Tags", {
                "c": ["C", "int", 0],
                "x": ["X", "str", ""]
            }, []],
            "colors": ["Colors", ["red", "blue"], []]
        }))
        .unwrap()
    }

    pub fn pot() -> ConfigDict {
        ConfigDict::new("config", pot_rules())
    }

    /// Application-style rules built in code: a system section, a map of
    /// paths and a list of routes.
    pub fn sys_rules() -> RuleSet {
        let sys = RuleSet::new()
            .with("http_port", Rule::new("Listening port for web UI", Check::Int, 33411))
            .unwrap()
            .with("http_host", Rule::new("Listening host for web UI", Check::Hostname, "localhost"))
            .unwrap()
            .with("debug", Rule::new("Debugging flags", Check::Str, RuleDefault::None))
            .unwrap();
        let route = RuleSet::new()
            .with("name", Rule::new("Route name", Check::Slug, ""))
            .unwrap()
            .with("enabled", Rule::new("Route enabled", Check::Bool, true))
            .unwrap();
        RuleSet::new()
            .with("sys", Rule::section("Technical system settings", sys))
            .unwrap()
            .with("paths", Rule::map_of("Named directories", Check::Str))
            .unwrap()
            .with("routes", Rule::list_of("Routes", Checker::nested(route)))
            .unwrap()
    }

    #[test]
    fn fixtures_build() {
        use crate::engine::RuledContainer;

        let pot = pot();
        assert_eq!(pot.get("carrots").unwrap().as_int(), Some(99));
        let sys = ConfigDict::new("config", sys_rules());
        assert_eq!(sys.dict("sys").unwrap().comment(), Some("Technical system settings"));
        assert!(sys.dict("paths").unwrap().rules().has_wildcard());
    }
}
