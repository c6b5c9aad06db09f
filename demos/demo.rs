/* demos/demo.rs */

use clientip::{
    ClientIpResolver, HeaderMap, client_ip, header, parse_forwarded_header, set_trusted_proxies,
};

fn main() {
    println!("=== Client IP Resolution Examples ===\n");

    // Example 1: Default resolver trusts every peer
    example_1_default_resolver();

    // Example 2: Walking X-Forwarded-For behind a known proxy
    example_2_x_forwarded_for();

    // Example 3: Untrusted peers cannot spoof headers
    example_3_untrusted_peer();

    // Example 4: Explicit headers from a trusted ingress
    example_4_explicit_header();

    // Example 5: RFC 7239 Forwarded header
    example_5_forwarded();

    // Example 6: Replacing trusted proxies at runtime
    example_6_runtime_swap();

    println!("=== All examples completed! ===");
}

fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn show(label: &str, ip: String) {
    if ip.is_empty() {
        println!("{}: unknown", label);
    } else {
        println!("{}: {}", label, ip);
    }
}

fn example_1_default_resolver() {
    println!("Example 1: Default resolver trusts every peer");

    let headers = headers(&[("X-Forwarded-For", "203.0.113.1, 198.51.100.9")]);
    show(
        "Resolved IP (leftmost hop, every address is trusted)",
        client_ip(&headers, "192.0.2.10:52000", &[]),
    );
    println!();
}

fn example_2_x_forwarded_for() {
    println!("Example 2: Walking X-Forwarded-For behind a known proxy");

    let resolver = match ClientIpResolver::new().with_trusted_proxies(["127.0.0.1", "10.0.0.0/8"]) {
        Ok(resolver) => resolver,
        Err(err) => {
            println!("Invalid configuration: {}", err);
            return;
        }
    };

    let headers = headers(&[("X-Forwarded-For", "203.0.113.1, 10.0.0.5, 10.0.0.6")]);
    for (key, value) in &headers {
        println!("  {}: {}", key, value);
    }
    show(
        "Resolved IP (trusted hops skipped)",
        resolver.client_ip(&headers, "127.0.0.1:8080", &[]),
    );
    println!();
}

fn example_3_untrusted_peer() {
    println!("Example 3: Untrusted peers cannot spoof headers");

    let Ok(resolver) = ClientIpResolver::new().with_trusted_proxies(["10.0.0.0/8"]) else {
        return;
    };

    let headers = headers(&[("X-Real-IP", "1.2.3.4")]);
    show(
        "Resolved IP (peer, header ignored)",
        resolver.client_ip(&headers, "198.51.100.20:40000", &[]),
    );
    show(
        "Unparseable peer",
        resolver.client_ip(&headers, "not-an-address", &[]),
    );
    println!();
}

fn example_4_explicit_header() {
    println!("Example 4: Explicit headers from a trusted ingress");

    let resolver = ClientIpResolver::new().with_header(header::CF_CONNECTING_IP);
    let headers = headers(&[
        ("CF-Connecting-IP", "198.51.100.200"),
        ("X-Appengine-Remote-Addr", "192.0.2.77"),
        ("X-Forwarded-For", "192.0.2.50"),
    ]);

    show(
        "Instance header wins",
        resolver.client_ip(&headers, "10.0.0.1:443", &[]),
    );
    show(
        "Per-call header when the instance one is missing",
        ClientIpResolver::new().client_ip(
            &headers,
            "10.0.0.1:443",
            &[header::X_APPENGINE_REMOTE_ADDR],
        ),
    );
    println!();
}

fn example_5_forwarded() {
    println!("Example 5: RFC 7239 Forwarded header");

    let value = "for=192.0.2.43, for=198.51.100.17;by=203.0.113.60;proto=http;host=example.com";
    match parse_forwarded_header(value) {
        Ok(elements) => {
            for (idx, element) in elements.iter().enumerate() {
                println!("  element {}: {:?}", idx, element);
            }
        }
        Err(err) => println!("Parse error: {}", err),
    }

    match parse_forwarded_header("for=192.0.2.43;bogus=1") {
        Ok(_) => println!("Unexpectedly parsed"),
        Err(err) => println!("Rejected: {}", err),
    }

    let headers = headers(&[("Forwarded", value)]);
    show(
        "Resolved IP from Forwarded",
        ClientIpResolver::new().client_ip(&headers, "[::1]:8080", &[]),
    );
    println!();
}

fn example_6_runtime_swap() {
    println!("Example 6: Replacing trusted proxies at runtime");

    let headers = headers(&[("X-Forwarded-For", "203.0.113.9")]);
    show("Before", client_ip(&headers, "192.0.2.1:9000", &[]));

    if let Err(err) = set_trusted_proxies(["10.0.0.0/8", "not-a-cidr"]) {
        println!("Rejected configuration kept the previous set: {}", err);
    }

    if set_trusted_proxies(["127.0.0.1"]).is_ok() {
        show("After narrowing", client_ip(&headers, "192.0.2.1:9000", &[]));
    }
    println!();
}
