// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall as _;
use assert_matches::assert_matches;
use epic_nft_core::{
    provider::{MintedEvent, ReadMethod},
    ContractProxy, WalletProvider,
};
use epic_nft_ethereum::{
    common::{makeAnEpicNFTCall, totalSupplyCall},
    test_utils::{encoded_uint, minted_log, mock_contract, MockTransport},
    Eip1193Wallet, EthereumServiceError,
};
use futures::StreamExt as _;
use serde_json::json;

#[test_log::test(tokio::test)]
async fn test_wallet_queries() -> anyhow::Result<()> {
    let transport = MockTransport::new();
    let account = Address::repeat_byte(0xab);
    transport
        .respond("eth_chainId", json!("0x4"))
        .respond("eth_accounts", json!([]))
        .respond("eth_requestAccounts", json!([account]));
    let wallet = Eip1193Wallet::new(transport.clone());

    assert_eq!(wallet.chain_id().await?, "0x4");
    assert!(wallet.accounts().await?.is_empty());
    assert_eq!(wallet.request_accounts().await?, vec![account]);
    let methods = transport
        .requests()
        .into_iter()
        .map(|(method, _)| method)
        .collect::<Vec<_>>();
    assert_eq!(methods, ["eth_chainId", "eth_accounts", "eth_requestAccounts"]);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_rejected_request() {
    let transport = MockTransport::new();
    transport.fail("eth_requestAccounts", 4001, "User rejected the request.");
    let wallet = Eip1193Wallet::new(transport);

    assert_matches!(
        wallet.request_accounts().await,
        Err(EthereumServiceError::JsonRpcError { code: 4001, .. })
    );
}

#[test_log::test(tokio::test)]
async fn test_read_counters() -> anyhow::Result<()> {
    let transport = MockTransport::new();
    transport.respond("eth_call", encoded_uint(50));
    let contract = mock_contract(&transport);

    assert_eq!(
        contract.read(ReadMethod::TotalSupply).await?,
        Some(U256::from(50))
    );
    let params = transport.params_of("eth_call");
    let expected_data = alloy_primitives::Bytes::from(totalSupplyCall {}.abi_encode());
    assert_eq!(
        params[0],
        json!([{ "to": contract.address(), "data": expected_data }, "latest"])
    );

    transport.respond("eth_call", json!("0x"));
    assert_eq!(contract.read(ReadMethod::TotalMinted).await?, Some(U256::from(50)));
    assert_eq!(contract.read(ReadMethod::TotalMinted).await?, None);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_mint_and_confirm() -> anyhow::Result<()> {
    let transport = MockTransport::new();
    let hash = B256::repeat_byte(0x11);
    let account = Address::repeat_byte(0xab);
    transport
        .respond("eth_sendTransaction", json!(hash))
        .respond("eth_getTransactionReceipt", json!(null))
        .respond(
            "eth_getTransactionReceipt",
            json!({ "transactionHash": hash, "blockNumber": "0x2a", "status": "0x1" }),
        );
    let contract = mock_contract(&transport);

    assert_eq!(contract.mint(account).await?, hash);
    let sent = transport.params_of("eth_sendTransaction");
    let expected_data = alloy_primitives::Bytes::from(makeAnEpicNFTCall {}.abi_encode());
    assert_eq!(
        sent[0],
        json!([{ "from": account, "to": contract.address(), "data": expected_data }])
    );

    let transaction = contract.confirm(hash).await?;
    assert_eq!(transaction.hash, hash);
    assert_eq!(transaction.block_number, Some(42));
    assert_eq!(transport.params_of("eth_getTransactionReceipt").len(), 2);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_reverted_transaction() {
    let transport = MockTransport::new();
    let hash = B256::repeat_byte(0x22);
    transport.respond(
        "eth_getTransactionReceipt",
        json!({ "transactionHash": hash, "blockNumber": "0x2a", "status": "0x0" }),
    );
    let contract = mock_contract(&transport);

    assert_matches!(
        contract.confirm(hash).await,
        Err(EthereumServiceError::TransactionReverted(reverted)) if reverted == hash
    );
}

#[test_log::test(tokio::test)]
async fn test_minted_events() -> anyhow::Result<()> {
    let transport = MockTransport::new();
    let sender = Address::repeat_byte(0xab);
    let mut other_log = minted_log(sender, 1, 0x11);
    other_log["topics"] = json!([B256::ZERO]);
    transport
        .respond("eth_blockNumber", json!("0x10"))
        .respond("eth_blockNumber", json!("0x11"))
        .respond(
            "eth_getLogs",
            json!([other_log, minted_log(sender, 2, 0x11), minted_log(sender, 3, 0x11)]),
        );
    let contract = mock_contract(&transport);

    let mut events = contract.subscribe_minted().await?;
    let first = events.next().await.unwrap()?;
    let second = events.next().await.unwrap()?;

    assert_eq!(
        first,
        MintedEvent {
            from: sender,
            token_id: U256::from(2)
        }
    );
    assert_eq!(second.token_id, U256::from(3));
    let filters = transport.params_of("eth_getLogs");
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0][0]["fromBlock"], json!("0x11"));
    assert_eq!(filters[0][0]["toBlock"], json!("0x11"));
    Ok(())
}
