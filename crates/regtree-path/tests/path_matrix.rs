use regtree_path::{Namespace, NodePath, PathSeparator, PathSegments, DEFAULT_TLDS};

#[test]
fn segments_edit_matrix() {
    let mut p = PathSegments::parse("srv.eu.cache", ".").unwrap();
    assert_eq!(p.len(), 3);
    assert_eq!(p.get(0), Some("srv"));
    assert_eq!(p.get(3), None);
    assert_eq!(p.join(), "srv.eu.cache");

    p.append("shard0").unwrap();
    assert_eq!(p.join(), "srv.eu.cache.shard0");
    p.prepend("prod").unwrap();
    assert_eq!(p.join(), "prod.srv.eu.cache.shard0");

    assert_eq!(p.sub_range(1, 3).join(), "srv.eu");
    assert_eq!(p.reversed().join(), "shard0.cache.eu.srv.prod");

    assert_eq!(p.drop_first(), Some("prod".to_string()));
    assert_eq!(p.join(), "srv.eu.cache.shard0");

    assert!(p.append("bad.seg").is_err());
    assert!(p.append("").is_err());
    assert_eq!(p.join(), "srv.eu.cache.shard0");
}

#[test]
fn scoring_matrix() {
    let base = Namespace::parse("srv.eu.cache");

    assert_eq!(base.match_percentage(&Namespace::parse("srv.eu.cache")), 100);
    assert_eq!(base.match_percentage(&Namespace::parse("srv.eu.cache.s0")), 110);
    assert_eq!(
        base.match_percentage(&Namespace::parse("srv.eu.cache.s0.a.b")),
        130
    );
    assert_eq!(base.match_percentage(&Namespace::parse("srv.eu")), 66);
    assert_eq!(base.match_percentage(&Namespace::parse("srv")), 33);
    assert_eq!(base.match_percentage(&Namespace::parse("srv.us.cache")), 33);
    assert_eq!(base.match_percentage(&Namespace::parse("web.eu.cache")), 0);
    assert_eq!(base.match_percentage(&Namespace::parse("")), 0);

    // The empty namespace prefixes everything and only collects the
    // per-extra-segment bonus.
    let empty = Namespace::parse("");
    assert_eq!(empty.match_percentage(&empty), 100);
    assert_eq!(empty.match_percentage(&Namespace::parse("a.b")), 120);

    assert!(Namespace::parse("srv.eu").is_prefix_of(&base));
    assert!(!Namespace::parse("eu.srv").is_prefix_of(&base));
}

#[test]
fn pattern_matrix() {
    let re = Namespace::parse("srv.*.cache").compile_pattern().unwrap();
    assert!(re.is_match("srv.eu.cache"));
    assert!(re.is_match("SRV.EU.CACHE"));
    assert!(re.is_match("srv..cache"));
    assert!(!re.is_match("web.eu.cache"));

    let re = Namespace::parse("node-1-4").compile_pattern().unwrap();
    assert!(re.is_match("node-1"));
    assert!(re.is_match("node-3"));
    assert!(re.is_match("node-4"));
    assert!(!re.is_match("node-5"));
    assert!(!re.is_match("node-"));

    let re = Namespace::parse("host*.2-3.disk").compile_pattern().unwrap();
    assert!(re.is_match("hosta.2.disk"));
    assert!(re.is_match("hostbb.3.disk"));
    assert!(!re.is_match("hosta.4.disk"));

    // Regex metacharacters in plain segments stay literal.
    let re = Namespace::parse("a+b").compile_pattern().unwrap();
    assert!(re.is_match("a+b"));
    assert!(!re.is_match("aab"));
}

#[test]
fn domain_split_matrix() {
    let split = Namespace::parse("www.example.com").split_domain_default().unwrap();
    assert_eq!(split.tld.join(), "com");
    assert_eq!(split.child_domain.join(), "www.example");

    let split = Namespace::parse("deep.shop.example.co.uk")
        .split_domain_default()
        .unwrap();
    assert_eq!(split.tld.join(), "co.uk");
    assert_eq!(split.child_domain.join(), "deep.shop.example");

    assert!(Namespace::parse("com").split_domain_default().is_none());
    assert!(Namespace::parse("").split_domain_default().is_none());
    assert!(Namespace::parse("a.b.weird").split_domain(DEFAULT_TLDS).is_none());

    let split = Namespace::parse("x.y.lan").split_domain(&["lan"]).unwrap();
    assert_eq!(split.tld.join(), "lan");
    assert_eq!(split.child_domain.join(), "x.y");
}

#[test]
fn node_path_matrix() {
    let abs = NodePath::parse("/etc/regtree/conf", PathSeparator::Slash);
    assert!(abs.is_absolute());
    assert_eq!(abs.len(), 3);
    assert_eq!(abs.render(), "/etc/regtree/conf");
    assert_eq!(abs.to_string(), "/etc/regtree/conf");

    let rel = NodePath::parse("regtree/conf", PathSeparator::Slash);
    assert!(!rel.is_absolute());
    assert_eq!(rel.render(), "regtree/conf");
    assert!(rel.is_prefix_of(&NodePath::parse(
        "regtree/conf/extra",
        PathSeparator::Slash
    )));

    let win = NodePath::parse_detected("\\Users\\svc");
    assert_eq!(win.separator(), PathSeparator::Backslash);
    assert!(win.is_absolute());
    assert_eq!(win.render(), "\\Users\\svc");

    let flat = NodePath::parse_detected("a_b_c");
    assert_eq!(flat.separator(), PathSeparator::Underscore);
    assert_eq!(flat.to_namespace().join(), "a.b.c");

    let mut p = NodePath::parse("/a/b/c", PathSeparator::Slash);
    assert_eq!(
        p.match_percentage(&NodePath::parse("/a/b/c/d", PathSeparator::Slash)),
        110
    );
    p.drop_first();
    assert!(!p.is_absolute());
    assert_eq!(p.render(), "b/c");
}
