mod stream_analysis;
