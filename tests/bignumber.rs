use ifvm_metaclasses::bignum::{arith, cache::RegisterPool, transcendental, BigNumber};

#[test]
fn arithmetic_round_trip_through_a_precision_chain() {
    let a = BigNumber::from_i32(7, Some(12));
    let b = BigNumber::from_i32(3, Some(12));
    let sum = arith::add(&a, &b);
    assert_eq!(sum.to_i32().unwrap(), 10);
    let product = arith::mul(&a, &b);
    assert_eq!(product.to_i32().unwrap(), 21);
}

#[test]
fn division_by_zero_is_rejected() {
    let a = BigNumber::from_i32(1, Some(12));
    let zero = BigNumber::zero(12);
    assert!(arith::div(&a, &zero).is_err());
}

#[test]
fn transcendental_suite_agrees_with_inverse_identities() {
    let x = BigNumber::from_i32(2, Some(20));
    let ln_x = transcendental::ln(&x, 20).unwrap();
    let back = transcendental::exp(&ln_x, 20).unwrap();
    let diff = arith::sub(&back, &x);
    assert!(diff.to_i32().unwrap_or(0).abs() <= 1 || diff.is_zero());
}

#[test]
fn sqrt_of_negative_is_out_of_range() {
    let neg = BigNumber::from_i32(-4, Some(12));
    assert!(transcendental::sqrt(&neg, 12).is_err());
}

#[test]
fn register_pool_respects_an_explicit_cap() {
    let pool = RegisterPool::new();
    assert!(pool.lease_many(2, 16, Some(1)).is_err());
    let leases = pool.lease_many(2, 16, Some(4)).unwrap();
    assert_eq!(leases.len(), 2);
}

#[test]
fn formatted_rendering_respects_max_digits() {
    use ifvm_metaclasses::bignum::format::{format, FormatSpec};

    let value = BigNumber::parse("3.14159265", Some(12)).unwrap();
    let spec = FormatSpec { max_digits: 4, ..Default::default() };
    let rendered = format(&value, &spec);
    assert!(rendered.starts_with("3.14"));
}
