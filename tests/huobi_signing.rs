use firstfill::exchange::huobi::HuobiClient;

const SECRET: &str = "b0xxxxxx-c6xxxxxx-94xxxxxx-dxxxx";

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn order_query_params() -> Vec<(String, String)> {
    params(&[
        ("AccessKeyId", "e2xxxxxx-99xxxxxx-84xxxxxx-7xxxx"),
        ("SignatureMethod", "HmacSHA256"),
        ("SignatureVersion", "2"),
        ("Timestamp", "2017-05-11T15:19:30"),
        ("order-id", "1234567890"),
    ])
}

#[test]
fn empty_params_sign_like_plain_hmac_sha256_base64() {
    let canonical = HuobiClient::canonical_request("get", "Host", "/p", &[]);
    assert_eq!(canonical, "GET\nhost\n/p\n");
    let signature = HuobiClient::sign("key", "get", "Host", "/p", &[]).expect("sign");
    assert_eq!(signature, "Ez61KyJ62zcpBJwzc6JMta8KUAmvKhcu4RfiyZTKngg=");
}

#[test]
fn canonical_request_normalizes_case_and_sorts_keys() {
    let canonical = HuobiClient::canonical_request(
        "get",
        "Api.Huobi.Pro",
        "/v1/order/orders",
        &order_query_params(),
    );
    assert_eq!(
        canonical,
        "GET\napi.huobi.pro\n/v1/order/orders\nAccessKeyId=e2xxxxxx-99xxxxxx-84xxxxxx-7xxxx&SignatureMethod=HmacSHA256&SignatureVersion=2&Timestamp=2017-05-11T15%3A19%3A30&order-id=1234567890"
    );
}

#[test]
fn signature_matches_known_vector() {
    let signature = HuobiClient::sign(
        SECRET,
        "GET",
        "api.huobi.pro",
        "/v1/order/orders",
        &order_query_params(),
    )
    .expect("sign");
    assert_eq!(signature, "Nmd8AU8uAe0mkFpxNbiava0aeZzBEtYjCdie1ZYZjoM=");
}

#[test]
fn signature_is_deterministic() {
    let first =
        HuobiClient::sign(SECRET, "GET", "api.huobi.pro", "/v1/order/orders", &order_query_params())
            .expect("sign");
    let second =
        HuobiClient::sign(SECRET, "GET", "api.huobi.pro", "/v1/order/orders", &order_query_params())
            .expect("sign");
    assert_eq!(first, second);
}

#[test]
fn insertion_order_does_not_change_signature() {
    let mut reversed = order_query_params();
    reversed.reverse();
    let sorted =
        HuobiClient::sign(SECRET, "GET", "api.huobi.pro", "/v1/order/orders", &order_query_params())
            .expect("sign");
    let shuffled = HuobiClient::sign(SECRET, "GET", "api.huobi.pro", "/v1/order/orders", &reversed)
        .expect("sign");
    assert_eq!(sorted, shuffled);
}

#[test]
fn any_single_change_changes_signature() {
    let base =
        HuobiClient::sign(SECRET, "GET", "api.huobi.pro", "/v1/order/orders", &order_query_params())
            .expect("sign");

    let mut changed_value = order_query_params();
    changed_value[4].1 = "1234567891".to_string();
    let mut changed_key = order_query_params();
    changed_key[4].0 = "order-ids".to_string();

    let variants = [
        HuobiClient::sign(SECRET, "GET", "api.huobi.pro", "/v1/order/orders", &changed_value),
        HuobiClient::sign(SECRET, "GET", "api.huobi.pro", "/v1/order/orders", &changed_key),
        HuobiClient::sign(SECRET, "POST", "api.huobi.pro", "/v1/order/orders", &order_query_params()),
        HuobiClient::sign(SECRET, "GET", "api-aws.huobi.pro", "/v1/order/orders", &order_query_params()),
        HuobiClient::sign(SECRET, "GET", "api.huobi.pro", "/v1/order/order", &order_query_params()),
        HuobiClient::sign("other-secret", "GET", "api.huobi.pro", "/v1/order/orders", &order_query_params()),
    ];
    for variant in variants {
        assert_ne!(variant.expect("sign"), base);
    }
}
