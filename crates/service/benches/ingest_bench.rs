use criterion::{criterion_group, criterion_main, Criterion};

use service::ingest::normalize_reader;
use service::payment::PaymentQuery;

const HEADER: &str = "payee_first_name,payee_last_name,payee_payment_status,payee_added_date_utc,payee_due_date,payee_address_line_1,payee_address_line_2,payee_city,payee_country,payee_province_or_state,payee_postal_code,payee_phone_number,payee_email,currency,discount_percent,tax_percent,due_amount";

fn seed_csv(rows: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..rows {
        csv.push_str(&format!(
            "Name{i},Surname{i},pending,1700000000,2025-0{}-15,{i} Main St,,City{},Country{},,{:05},555{i:07},user{i}@example.com,USD,{},{},{}.50\n",
            i % 9 + 1,
            i % 20,
            i % 5,
            i,
            i % 10,
            i % 15,
            100 + i
        ));
    }
    csv
}

fn bench_normalize(c: &mut Criterion) {
    let csv = seed_csv(1_000);
    c.bench_function("ingest_normalize_1k_rows", |b| {
        b.iter(|| {
            let batch = normalize_reader(csv.as_bytes()).unwrap();
            assert_eq!(batch.payments.len(), 1_000);
        });
    });
}

fn bench_search_match(c: &mut Criterion) {
    let batch = normalize_reader(seed_csv(1_000).as_bytes()).unwrap();
    let query = PaymentQuery { search: Some("USER99".into()), ..Default::default() };
    c.bench_function("query_matches_1k_payments", |b| {
        b.iter(|| batch.payments.iter().filter(|p| query.matches(p)).count());
    });
}

criterion_group!(benches, bench_normalize, bench_search_match);
criterion_main!(benches);
