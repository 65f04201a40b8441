diesel::table! {
    cart_items (id) {
        id -> Uuid,
        cart_id -> Uuid,
        product_id -> Uuid,
        size_id -> Int4,
        quantity -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    carts (id) {
        id -> Uuid,
        buyer_id -> Uuid,
    }
}

diesel::table! {
    order_items (id) {
        id -> Uuid,
        order_id -> Uuid,
        product_id -> Uuid,
        size_id -> Int4,
        quantity -> Int4,
        price -> Numeric,
        is_reviewed -> Bool,
    }
}

diesel::table! {
    orders (id) {
        id -> Uuid,
        buyer_id -> Uuid,
        name -> Varchar,
        phone_number -> Varchar,
        address -> Varchar,
        subtotal -> Numeric,
        total_quantity -> Int4,
        use_point -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        order_id -> Uuid,
        price -> Numeric,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    products (id) {
        id -> Uuid,
        name -> Varchar,
        image -> Nullable<Varchar>,
        price -> Numeric,
        discount_rate -> Nullable<Int4>,
        discount_start_time -> Nullable<Timestamptz>,
        discount_end_time -> Nullable<Timestamptz>,
        is_sold_out -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    reviews (id) {
        id -> Uuid,
        product_id -> Uuid,
        user_id -> Uuid,
        rating -> Int4,
        content -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    sizes (id) {
        id -> Int4,
        en -> Varchar,
        ko -> Varchar,
    }
}

diesel::table! {
    stocks (product_id, size_id) {
        product_id -> Uuid,
        size_id -> Int4,
        quantity -> Int4,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        points -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(cart_items -> carts (cart_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(payments -> orders (order_id));
diesel::joinable!(stocks -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(
    cart_items,
    carts,
    order_items,
    orders,
    payments,
    products,
    reviews,
    sizes,
    stocks,
    users,
);
